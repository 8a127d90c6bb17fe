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
    /// Lowest non-cancelled bid currently on record for the item.
    pub async fn get_in_memory_best_bid(
        &self,
        session_id: SessionId,
        item_id: ItemId,
    ) -> Option<entities::Bid> {
        self.in_memory_store
            .bids
            .read()
            .await
            .get(&session_id)?
            .iter()
            .filter(|bid| !bid.cancelled && bid.item_id == item_id)
            .min_by(|a, b| a.amount.cmp(&b.amount))
            .cloned()
    }
}
