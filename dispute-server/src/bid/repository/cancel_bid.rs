use {
    super::Repository,
    crate::{
        api::RestError,
        bid::entities,
        kernel::entities::SessionId,
    },
};

impl Repository {
    /// Flips the cancelled flag in the ledger. The bid simply stops counting
    /// toward "current best" and "bidder's last" on the next query; ordering
    /// of the other bids is never re-validated.
    pub async fn cancel_in_memory_bid(
        &self,
        session_id: SessionId,
        bid_id: entities::BidId,
    ) -> Option<entities::Bid> {
        self.in_memory_store
            .bids
            .write()
            .await
            .get_mut(&session_id)?
            .iter_mut()
            .find(|bid| bid.id == bid_id)
            .map(|bid| {
                bid.cancelled = true;
                bid.clone()
            })
    }

    pub async fn persist_bid_cancellation(
        &self,
        bid_id: entities::BidId,
    ) -> Result<(), RestError> {
        self.db.cancel_bid(bid_id).await
    }
}
