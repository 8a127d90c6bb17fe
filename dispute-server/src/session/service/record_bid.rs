use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::SessionId,
        session::entities,
    },
    time::OffsetDateTime,
};

impl Service {
    /// Restarts the inactivity clock for an accepted bid and clears an active
    /// random closing window. Called by bid arbitration while it holds the
    /// session lock; returns whether the bid caused a prorrogation, plus the
    /// committed session state for the caller to mirror durably.
    pub async fn record_bid_for_lock(
        &self,
        session_id: SessionId,
        now: OffsetDateTime,
    ) -> Result<(bool, entities::Session), RestError> {
        let mut session = self.get_in_memory_session(session_id).await?;
        let extended = session.record_bid(now)?;
        self.repo.update_in_memory_session(&session).await;
        Ok((extended, session))
    }
}
