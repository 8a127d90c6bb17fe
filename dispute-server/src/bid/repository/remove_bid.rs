use {
    super::Repository,
    crate::{
        bid::entities,
        kernel::entities::SessionId,
    },
};

impl Repository {
    /// Unwinds a bid whose durable mirror failed. The entry is removed
    /// outright: a bid that was never reported as committed leaves no trace
    /// in the ledger.
    pub async fn remove_in_memory_bid(&self, session_id: SessionId, bid_id: entities::BidId) {
        if let Some(bids) = self.in_memory_store.bids.write().await.get_mut(&session_id) {
            bids.retain(|bid| bid.id != bid_id);
        }
    }

    pub async fn remove_in_memory_session_bids(&self, session_id: SessionId) {
        self.in_memory_store.bids.write().await.remove(&session_id);
    }
}
