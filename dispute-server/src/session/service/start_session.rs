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
pub struct StartSessionInput {
    pub session_id: SessionId,
    pub actor:      String,
}

impl Service {
    #[tracing::instrument(skip_all, fields(session_id = %input.session_id), err(level = tracing::Level::TRACE))]
    pub async fn start_session(&self, input: StartSessionInput) -> Result<(), RestError> {
        let lock = self.session_lock(input.session_id).await?;
        let (session, event) = {
            let _guard = lock.lock().await;
            let mut session = self.get_in_memory_session(input.session_id).await?;
            let now = OffsetDateTime::now_utc();
            session.start(now)?;
            self.repo.update_in_memory_session(&session).await;
            let event = self
                .audit
                .append_in_memory(
                    AppendEventInput {
                        session_id:  input.session_id,
                        kind:        EventKind::SessionStarted,
                        description: format!(
                            "Public session opened by auctioneer {}",
                            input.actor
                        ),
                        item_id:     None,
                        bidder:      None,
                        bid_id:      None,
                        amount:      None,
                        actor:       Actor::User(input.actor),
                        payload:     None,
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
