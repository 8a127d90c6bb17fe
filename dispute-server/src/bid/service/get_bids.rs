use {
    super::Service,
    crate::{
        api::RestError,
        bid::entities,
        kernel::entities::{
            ItemId,
            SessionId,
        },
    },
};

impl Service {
    /// Non-cancelled bids for the item, best first.
    pub async fn get_ranked_bids(
        &self,
        session_id: SessionId,
        item_id: ItemId,
    ) -> Result<Vec<entities::Bid>, RestError> {
        self.sessions.get_in_memory_session(session_id).await?;
        Ok(self
            .repo
            .get_in_memory_ranked_bids(session_id, item_id)
            .await)
    }

    /// Every bid of the session, cancelled ones included, in commit order.
    pub async fn get_session_bids(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<entities::Bid>, RestError> {
        self.sessions.get_in_memory_session(session_id).await?;
        Ok(self.repo.get_in_memory_bids(session_id).await)
    }
}
