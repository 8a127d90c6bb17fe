use {
    super::entities,
    crate::kernel::entities::SessionId,
    std::{
        collections::HashMap,
        sync::Arc,
    },
    tokio::sync::RwLock,
};

mod add_event;
mod get_events;
mod models;
mod remove_events;

pub use models::*;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub events: RwLock<HashMap<SessionId, Vec<entities::AuditEvent>>>,
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
