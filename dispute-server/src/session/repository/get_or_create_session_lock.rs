use {
    super::Repository,
    crate::{
        kernel::entities::SessionId,
        session::entities,
    },
};

impl Repository {
    pub async fn get_or_create_in_memory_session_lock(
        &self,
        session_id: SessionId,
    ) -> entities::SessionLock {
        self.in_memory_store
            .session_lock
            .lock()
            .await
            .entry(session_id)
            .or_default()
            .clone()
    }
}
