use {
    super::entities,
    crate::kernel::entities::SessionId,
    std::{
        collections::HashMap,
        sync::Arc,
    },
    tokio::sync::{
        Mutex,
        RwLock,
    },
};

mod add_chat_message;
mod add_session;
mod get_active_sessions;
mod get_chat_messages;
mod get_or_create_session_lock;
mod get_session;
mod models;
mod remove_session;
mod update_session;

pub use models::*;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub sessions:     RwLock<HashMap<SessionId, entities::Session>>,
    pub session_lock: Mutex<HashMap<SessionId, entities::SessionLock>>,
    pub chat:         RwLock<HashMap<SessionId, Vec<entities::ChatMessage>>>,
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
