use {
    super::Repository,
    crate::kernel::entities::SessionId,
};

impl Repository {
    pub async fn remove_in_memory_session(&self, session_id: SessionId) {
        self.in_memory_store
            .sessions
            .write()
            .await
            .remove(&session_id);
        self.in_memory_store.chat.write().await.remove(&session_id);
    }

    pub async fn remove_in_memory_session_lock(&self, session_id: &SessionId) {
        self.in_memory_store
            .session_lock
            .lock()
            .await
            .remove(session_id);
    }
}
