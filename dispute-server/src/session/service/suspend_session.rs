use {
    super::Service,
    crate::{
        api::RestError,
        audit::{
            entities::{
                Actor,
                EventKind,
            },
            service::append_event::AppendEventInput,
        },
        kernel::entities::SessionId,
    },
    time::OffsetDateTime,
};

#[derive(Clone, Debug)]
pub struct SuspendSessionInput {
    pub session_id: SessionId,
    pub reason:     String,
    pub actor:      String,
}

impl Service {
    #[tracing::instrument(skip_all, fields(session_id = %input.session_id), err(level = tracing::Level::TRACE))]
    pub async fn suspend_session(&self, input: SuspendSessionInput) -> Result<(), RestError> {
        let lock = self.session_lock(input.session_id).await?;
        let (session, event) = {
            let _guard = lock.lock().await;
            let mut session = self.get_in_memory_session(input.session_id).await?;
            let now = OffsetDateTime::now_utc();
            let window_discarded = session.suspend(input.reason.clone())?;
            self.repo.update_in_memory_session(&session).await;
            let mut description = format!("Session suspended. Reason: {}", input.reason);
            if window_discarded {
                description.push_str(" The random closing window was discarded.");
            }
            let event = self
                .audit
                .append_in_memory(
                    AppendEventInput {
                        session_id: input.session_id,
                        kind: EventKind::SessionSuspended,
                        description,
                        item_id: session.current_item_id,
                        bidder: None,
                        bid_id: None,
                        amount: None,
                        actor: Actor::User(input.actor),
                        payload: Some(serde_json::json!({ "reason": input.reason })),
                    },
                    now,
                )
                .await;
            (session, event)
        };
        self.repo.persist_session(&session).await?;
        self.audit.persist_events(&[event]).await?;
        self.broadcast_state(input.session_id).await;
        Ok(())
    }
}
