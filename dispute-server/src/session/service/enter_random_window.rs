use {
    super::Service,
    crate::{
        api::RestError,
        audit::{
            entities::{
                AuditEvent,
                EventKind,
            },
            service::append_event::AppendEventInput,
        },
        kernel::entities::SessionId,
        session::entities,
    },
    time::OffsetDateTime,
};

pub(super) struct WindowOutcome {
    pub session:        entities::Session,
    pub window:         entities::RandomWindow,
    pub events:         Vec<AuditEvent>,
    pub system_message: String,
}

impl Service {
    /// The in-memory half of opening the random closing window after
    /// inactivity. Callers hold the session lock. Returns `None` when the
    /// window is already active, so two racing ticks change state once.
    pub(super) async fn enter_random_window_for_lock(
        &self,
        session_id: SessionId,
        now: OffsetDateTime,
    ) -> Result<Option<WindowOutcome>, RestError> {
        let mut session = self.get_in_memory_session(session_id).await?;
        if session.in_random_window() {
            return Ok(None);
        }
        let duration = self.sampler.sample_window(
            session.timing.random_window_min,
            session.timing.random_window_max,
        );
        let window = session.enter_random_window(duration, now)?;
        self.repo.update_in_memory_session(&session).await;
        let event = self
            .audit
            .append_in_memory(
                AppendEventInput {
                    session_id,
                    kind: EventKind::RandomWindowStarted,
                    description:
                        "Random closing window started; any new bid extends the dispute"
                            .to_string(),
                    item_id: session.current_item_id,
                    bidder: None,
                    bid_id: None,
                    amount: None,
                    actor: crate::audit::entities::Actor::System,
                    payload: Some(serde_json::json!({
                        "window_secs": window.duration.as_secs(),
                    })),
                },
                now,
            )
            .await;
        Ok(Some(WindowOutcome {
            session,
            window,
            events: vec![event],
            system_message:
                "ATTENTION: random closing window started. The item may close at any moment!"
                    .to_string(),
        }))
    }

    /// Durable mirror and fan-out of a window entry, after the lock release.
    pub(super) async fn finish_window(&self, outcome: WindowOutcome) -> Result<(), RestError> {
        let session_id = outcome.session.id;
        tracing::info!(
            session_id = %session_id,
            window_secs = outcome.window.duration.as_secs(),
            "Random closing window opened"
        );
        self.repo.persist_session(&outcome.session).await?;
        self.audit.persist_events(&outcome.events).await?;
        self.send_system_message(session_id, outcome.system_message)
            .await;
        self.broadcast_state(session_id).await;
        Ok(())
    }
}
