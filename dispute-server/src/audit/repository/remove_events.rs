use {
    super::{
        entities,
        Repository,
    },
    crate::kernel::entities::SessionId,
};

impl Repository {
    /// Drops the in-memory trail when a session is torn down. The durable
    /// rows remain; `get_events` falls back to them.
    pub async fn remove_in_memory_events(&self, session_id: SessionId) {
        self.in_memory_store
            .events
            .write()
            .await
            .remove(&session_id);
    }

    /// Removes specific entries whose durable mirror failed, so the in-memory
    /// minutes never show an event that was not committed.
    pub async fn remove_in_memory_events_by_id(
        &self,
        session_id: SessionId,
        event_ids: &[entities::EventId],
    ) {
        if let Some(events) = self
            .in_memory_store
            .events
            .write()
            .await
            .get_mut(&session_id)
        {
            events.retain(|event| !event_ids.contains(&event.id));
        }
    }
}
