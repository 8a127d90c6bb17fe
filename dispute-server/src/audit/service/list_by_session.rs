use {
    super::Service,
    crate::{
        api::RestError,
        audit::entities,
        kernel::entities::SessionId,
    },
};

impl Service {
    #[tracing::instrument(skip_all, fields(session_id = %session_id))]
    pub async fn list_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<entities::AuditEvent>, RestError> {
        self.repo.get_events(session_id).await
    }

    pub async fn remove_session_trail(&self, session_id: SessionId) {
        self.repo.remove_in_memory_events(session_id).await;
    }

    /// Backs out in-memory entries whose durable mirror failed.
    pub async fn discard_events(&self, events: &[entities::AuditEvent]) {
        if let Some(first) = events.first() {
            let ids: Vec<entities::EventId> = events.iter().map(|event| event.id).collect();
            self.repo
                .remove_in_memory_events_by_id(first.session_id, &ids)
                .await;
        }
    }
}
