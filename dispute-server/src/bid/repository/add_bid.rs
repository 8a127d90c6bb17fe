use {
    super::Repository,
    crate::{
        api::RestError,
        bid::entities,
    },
};

impl Repository {
    /// Commits a bid to the in-memory ledger. Callers hold the session lock,
    /// which makes the surrounding read-validate-append sequence atomic.
    pub async fn add_in_memory_bid(&self, bid: entities::Bid) {
        self.in_memory_store
            .bids
            .write()
            .await
            .entry(bid.session_id)
            .or_insert_with(Vec::new)
            .push(bid);
    }

    /// Mirrors an accepted bid to durable storage, after the session lock is
    /// released. A failure here means the bid must not be reported as
    /// committed; the caller unwinds the in-memory entry.
    pub async fn persist_bid(&self, bid: &entities::Bid) -> Result<(), RestError> {
        self.db.add_bid(bid).await
    }
}
