use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::SessionId,
        session::entities,
    },
};

impl Service {
    /// The serialization primitive for this session. Every state-mutating
    /// path (bid arbitration, timer ticks, auctioneer operations) takes this
    /// lock before reading session state.
    pub async fn session_lock(
        &self,
        session_id: SessionId,
    ) -> Result<entities::SessionLock, RestError> {
        if self.repo.get_in_memory_session(session_id).await.is_none() {
            return Err(RestError::SessionNotFound);
        }
        Ok(self
            .repo
            .get_or_create_in_memory_session_lock(session_id)
            .await)
    }

    pub async fn get_in_memory_session(
        &self,
        session_id: SessionId,
    ) -> Result<entities::Session, RestError> {
        self.repo
            .get_in_memory_session(session_id)
            .await
            .ok_or(RestError::SessionNotFound)
    }

    /// Mirrors a committed session state to durable storage. Exposed for the
    /// bid arbitration path, which updates session timing as part of a bid.
    pub async fn persist_session(&self, session: &entities::Session) -> Result<(), RestError> {
        self.repo.persist_session(session).await
    }
}
