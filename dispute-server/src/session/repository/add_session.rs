use {
    super::Repository,
    crate::{
        api::RestError,
        session::entities,
    },
};

impl Repository {
    /// Creation is durable-first: the session only becomes visible in memory
    /// once its row exists.
    pub async fn add_session(&self, session: entities::Session) -> Result<(), RestError> {
        self.db.add_session(&session).await?;
        self.in_memory_store
            .sessions
            .write()
            .await
            .insert(session.id, session);
        Ok(())
    }
}
