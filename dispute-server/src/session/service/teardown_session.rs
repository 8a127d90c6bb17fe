use {
    super::Service,
    crate::kernel::entities::SessionId,
};

impl Service {
    /// Drops every in-memory structure of a terminal session. The durable
    /// rows remain the archived record; the final snapshot has already been
    /// broadcast by the caller.
    pub(super) async fn teardown_session(&self, session_id: SessionId) {
        self.repo.remove_in_memory_session(session_id).await;
        self.bids.remove_in_memory_session_bids(session_id).await;
        self.audit.remove_session_trail(session_id).await;
        self.repo.remove_in_memory_session_lock(&session_id).await;
        tracing::info!(session_id = %session_id, "Session torn down");
    }
}
