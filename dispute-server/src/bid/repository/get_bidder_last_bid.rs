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
    /// The bidder's most recent non-cancelled bid for the item, used for the
    /// self-improvement rule. Ledger entries are in commit order, so the last
    /// match is the most recent.
    pub async fn get_in_memory_last_bid_of(
        &self,
        session_id: SessionId,
        item_id: ItemId,
        bidder: &str,
    ) -> Option<entities::Bid> {
        self.in_memory_store
            .bids
            .read()
            .await
            .get(&session_id)?
            .iter()
            .filter(|bid| !bid.cancelled && bid.item_id == item_id && bid.bidder == bidder)
            .next_back()
            .cloned()
    }
}
