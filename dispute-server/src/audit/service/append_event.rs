use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        audit::entities,
        bid::entities::BidId,
        kernel::entities::{
            BidderHandle,
            ItemId,
            SessionId,
        },
    },
    rust_decimal::Decimal,
    time::OffsetDateTime,
    uuid::Uuid,
};

#[derive(Clone, Debug)]
pub struct AppendEventInput {
    pub session_id:  SessionId,
    pub kind:        entities::EventKind,
    pub description: String,
    pub item_id:     Option<ItemId>,
    pub bidder:      Option<BidderHandle>,
    pub bid_id:      Option<BidId>,
    pub amount:      Option<Decimal>,
    pub actor:       entities::Actor,
    pub payload:     Option<serde_json::Value>,
}

impl AppendEventInput {
    pub fn system(session_id: SessionId, kind: entities::EventKind, description: String) -> Self {
        Self {
            session_id,
            kind,
            description,
            item_id: None,
            bidder: None,
            bid_id: None,
            amount: None,
            actor: entities::Actor::System,
            payload: None,
        }
    }
}

impl Service {
    /// Appends to the in-memory trail and returns the stamped event. Must be
    /// called while the caller holds the session lock: the append order here
    /// becomes the legal minutes order.
    pub async fn append_in_memory(
        &self,
        input: AppendEventInput,
        occurred_at: OffsetDateTime,
    ) -> entities::AuditEvent {
        let event = entities::AuditEvent {
            id: Uuid::new_v4(),
            session_id: input.session_id,
            kind: input.kind,
            description: input.description,
            item_id: input.item_id,
            bidder: input.bidder,
            bid_id: input.bid_id,
            amount: input.amount,
            actor: input.actor,
            payload: input.payload,
            occurred_at,
        };
        self.repo.add_in_memory_event(event).await
    }

    /// Mirrors committed events to durable storage and feeds the real-time
    /// event stream. A failed write is escalated to the caller: a silently
    /// lost legal record is worse than a failed operation.
    #[tracing::instrument(skip_all, err(level = tracing::Level::TRACE))]
    pub async fn persist_events(
        &self,
        events: &[entities::AuditEvent],
    ) -> Result<(), RestError> {
        for event in events {
            self.repo.persist_event(event).await?;
            if let Err(e) = self
                .event_sender
                .send(UpdateEvent::NewEvent(event.into()))
            {
                tracing::trace!(error = ?e, "No subscriber for session event");
            }
        }
        Ok(())
    }
}
