use {
    super::Repository,
    crate::{
        api::RestError,
        audit::entities,
        kernel::entities::SessionId,
    },
};

impl Repository {
    /// The electronic minutes, timestamp ascending. Live sessions are served
    /// from memory; after teardown the durable trail is the source.
    pub async fn get_events(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<entities::AuditEvent>, RestError> {
        if let Some(events) = self.in_memory_store.events.read().await.get(&session_id) {
            return Ok(events.clone());
        }
        self.db.get_events(session_id).await
    }
}
