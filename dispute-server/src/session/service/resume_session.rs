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

impl Service {
    #[tracing::instrument(skip_all, fields(session_id = %session_id), err(level = tracing::Level::TRACE))]
    pub async fn resume_session(
        &self,
        session_id: SessionId,
        actor: String,
    ) -> Result<(), RestError> {
        let lock = self.session_lock(session_id).await?;
        let (session, event) = {
            let _guard = lock.lock().await;
            let mut session = self.get_in_memory_session(session_id).await?;
            let now = OffsetDateTime::now_utc();
            session.resume(now)?;
            self.repo.update_in_memory_session(&session).await;
            let event = self
                .audit
                .append_in_memory(
                    AppendEventInput {
                        session_id,
                        kind: EventKind::SessionResumed,
                        description: "Session resumed; the inactivity clock restarts from zero"
                            .to_string(),
                        item_id: session.current_item_id,
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
