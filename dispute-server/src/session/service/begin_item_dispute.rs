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
        kernel::entities::{
            ItemId,
            SessionId,
        },
    },
    time::OffsetDateTime,
};

#[derive(Clone, Debug)]
pub struct BeginItemDisputeInput {
    pub session_id: SessionId,
    pub item_id:    ItemId,
    pub actor:      String,
}

impl Service {
    #[tracing::instrument(
        skip_all,
        fields(session_id = %input.session_id, item_id = %input.item_id),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn begin_item_dispute(&self, input: BeginItemDisputeInput) -> Result<(), RestError> {
        let lock = self.session_lock(input.session_id).await?;
        let (session, event) = {
            let _guard = lock.lock().await;
            let mut session = self.get_in_memory_session(input.session_id).await?;
            let now = OffsetDateTime::now_utc();
            let item = session.begin_item_dispute(input.item_id, now)?;
            let description = format!(
                "Dispute opened for item {}: {}",
                item.number, item.description
            );
            self.repo.update_in_memory_session(&session).await;
            let event = self
                .audit
                .append_in_memory(
                    AppendEventInput {
                        session_id: input.session_id,
                        kind: EventKind::ItemDisputeStarted,
                        description,
                        item_id: Some(input.item_id),
                        bidder: None,
                        bid_id: None,
                        amount: None,
                        actor: Actor::User(input.actor),
                        payload: None,
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
