use {
    super::Repository,
    crate::kernel::entities::SessionId,
};

impl Repository {
    /// Sessions the closing-timer coordinator must visit: running or inside
    /// the random closing window. Terminal and suspended sessions are never
    /// scanned, keeping the tick cost proportional to live disputes.
    pub async fn get_in_memory_active_sessions(&self) -> Vec<SessionId> {
        self.in_memory_store
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.status.accepts_bids())
            .map(|session| session.id)
            .collect()
    }
}
