use {
    super::Repository,
    crate::{
        api::RestError,
        audit::entities,
    },
};

impl Repository {
    /// Appends to the in-memory trail. Callers hold the session lock, so the
    /// append order here is the commit order of the minutes. The timestamp is
    /// clamped against the previous entry: the wall clock may step backwards,
    /// the minutes ordering may not.
    pub async fn add_in_memory_event(
        &self,
        mut event: entities::AuditEvent,
    ) -> entities::AuditEvent {
        let mut events = self.in_memory_store.events.write().await;
        let session_events = events.entry(event.session_id).or_insert_with(Vec::new);
        if let Some(last) = session_events.last() {
            if last.occurred_at > event.occurred_at {
                event.occurred_at = last.occurred_at;
            }
        }
        session_events.push(event.clone());
        event
    }

    pub async fn persist_event(&self, event: &entities::AuditEvent) -> Result<(), RestError> {
        self.db.add_event(event).await
    }
}
