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
        session::entities,
    },
    time::OffsetDateTime,
};

impl Service {
    /// Phase bookkeeping is owned by the surrounding legal workflow; the
    /// engine records the transition and only ever reads the phase back.
    #[tracing::instrument(skip_all, fields(session_id = %session_id), err(level = tracing::Level::TRACE))]
    pub async fn advance_phase(
        &self,
        session_id: SessionId,
        phase: entities::SessionPhase,
        actor: String,
    ) -> Result<(), RestError> {
        let lock = self.session_lock(session_id).await?;
        let (session, event) = {
            let _guard = lock.lock().await;
            let mut session = self.get_in_memory_session(session_id).await?;
            let now = OffsetDateTime::now_utc();
            session.advance_phase(phase)?;
            self.repo.update_in_memory_session(&session).await;
            let event = self
                .audit
                .append_in_memory(
                    AppendEventInput {
                        session_id,
                        kind: EventKind::PhaseAdvanced,
                        description: format!("Phase advanced to {phase}"),
                        item_id: None,
                        bidder: None,
                        bid_id: None,
                        amount: None,
                        actor: Actor::User(actor),
                        payload: None,
                    },
                    now,
                )
                .await;
            (session, event)
        };
        self.repo.persist_session(&session).await?;
        self.audit.persist_events(&[event]).await?;
        self.broadcast_state(session_id).await;
        Ok(())
    }
}
