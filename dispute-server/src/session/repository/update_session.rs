use {
    super::Repository,
    crate::{
        api::RestError,
        session::entities,
    },
};

impl Repository {
    /// Writes a mutated session back to the authoritative in-memory store.
    /// Callers hold the session lock, so the overwrite cannot race another
    /// mutation of the same session.
    pub async fn update_in_memory_session(&self, session: &entities::Session) {
        self.in_memory_store
            .sessions
            .write()
            .await
            .insert(session.id, session.clone());
    }

    /// Mirrors a committed session state to durable storage. Called after the
    /// session lock is released so storage latency never serializes into the
    /// bid path.
    pub async fn persist_session(&self, session: &entities::Session) -> Result<(), RestError> {
        self.db.update_session(session).await
    }
}
