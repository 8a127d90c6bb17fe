use {
    super::Repository,
    crate::{
        bid::entities,
        kernel::entities::{
            ItemId,
            SessionId,
        },
    },
};

impl Repository {
    /// Non-cancelled bids for one item, best (lowest) first. This is the
    /// ranking shown to participants.
    pub async fn get_in_memory_ranked_bids(
        &self,
        session_id: SessionId,
        item_id: ItemId,
    ) -> Vec<entities::Bid> {
        let mut bids: Vec<entities::Bid> = self
            .in_memory_store
            .bids
            .read()
            .await
            .get(&session_id)
            .map(|bids| {
                bids.iter()
                    .filter(|bid| !bid.cancelled && bid.item_id == item_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        bids.sort_by(|a, b| a.amount.cmp(&b.amount));
        bids
    }

    pub async fn get_in_memory_bids(&self, session_id: SessionId) -> Vec<entities::Bid> {
        self.in_memory_store
            .bids
            .read()
            .await
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }
}
