use {
    super::entities,
    crate::kernel::entities::SessionId,
    std::{
        collections::HashMap,
        sync::Arc,
    },
    tokio::sync::RwLock,
};

mod add_bid;
mod cancel_bid;
mod get_best_bid;
mod get_bidder_last_bid;
mod get_bids;
mod models;
mod remove_bid;

pub use models::*;

/// The bid ledger: append-only per-session bid lists. Partitioned by session
/// id, so sessions never contend with each other here.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub bids: RwLock<HashMap<SessionId, Vec<entities::Bid>>>,
}

#[derive(Debug)]
pub struct Repository {
    pub in_memory_store: InMemoryStore,
    pub db:              Arc<dyn Database>,
}

impl Repository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db,
        }
    }
}
