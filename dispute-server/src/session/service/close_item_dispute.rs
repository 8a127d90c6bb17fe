use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        audit::{
            entities::{
                Actor,
                AuditEvent,
                EventKind,
            },
            service::append_event::AppendEventInput,
        },
        kernel::entities::{
            mask_handle,
            SessionId,
        },
        session::entities,
    },
    dispute_api_types::session::AdjudicationCandidate,
    time::OffsetDateTime,
};

#[derive(Clone, Debug)]
pub struct CloseItemDisputeInput {
    pub session_id: SessionId,
    pub actor:      String,
}

#[derive(Clone, Debug)]
pub(super) enum CloseTrigger {
    Auctioneer(String),
    Timer,
}

/// Everything decided under the session lock for an item closure; durable
/// mirroring and fan-out happen after the lock is released.
pub(super) struct CloseOutcome {
    pub session:        entities::Session,
    pub events:         Vec<AuditEvent>,
    pub candidate:      AdjudicationCandidate,
    pub system_message: String,
    pub session_closed: bool,
}

impl Service {
    /// Manual override of the closing timer by the auctioneer.
    #[tracing::instrument(skip_all, fields(session_id = %input.session_id), err(level = tracing::Level::TRACE))]
    pub async fn close_item_dispute(&self, input: CloseItemDisputeInput) -> Result<(), RestError> {
        let lock = self.session_lock(input.session_id).await?;
        let outcome = {
            let _guard = lock.lock().await;
            self.close_item_for_lock(
                input.session_id,
                CloseTrigger::Auctioneer(input.actor),
                OffsetDateTime::now_utc(),
            )
            .await?
        };
        self.finish_close(outcome).await
    }

    /// The in-memory half of closing the current item. Callers hold the
    /// session lock.
    pub(super) async fn close_item_for_lock(
        &self,
        session_id: SessionId,
        trigger: CloseTrigger,
        now: OffsetDateTime,
    ) -> Result<CloseOutcome, RestError> {
        let mut session = self.get_in_memory_session(session_id).await?;
        let closed = session.close_current_item(now)?;
        let best = self
            .bids
            .get_in_memory_best_bid(session_id, closed.item_id)
            .await;
        self.repo.update_in_memory_session(&session).await;

        let how = match &trigger {
            CloseTrigger::Auctioneer(_) => "by the auctioneer",
            CloseTrigger::Timer => "automatically by time",
        };
        let description = match &best {
            Some(bid) => format!(
                "Dispute ended {how}. Best bid: R$ {} ({})",
                bid.amount,
                mask_handle(&bid.bidder)
            ),
            None => format!("Dispute ended {how} with no bids"),
        };
        let actor = match &trigger {
            CloseTrigger::Auctioneer(name) => Actor::User(name.clone()),
            CloseTrigger::Timer => Actor::System,
        };
        let mut events = vec![
            self.audit
                .append_in_memory(
                    AppendEventInput {
                        session_id,
                        kind: EventKind::ItemDisputeEnded,
                        description,
                        item_id: Some(closed.item_id),
                        bidder: best.as_ref().map(|bid| bid.bidder.clone()),
                        bid_id: best.as_ref().map(|bid| bid.id),
                        amount: best.as_ref().map(|bid| bid.amount),
                        actor,
                        payload: None,
                    },
                    now,
                )
                .await,
        ];
        if closed.session_closed {
            events.push(
                self.audit
                    .append_in_memory(
                        AppendEventInput::system(
                            session_id,
                            EventKind::SessionClosed,
                            "All items disputed; session closed".to_string(),
                        ),
                        now,
                    )
                    .await,
            );
        }
        Ok(CloseOutcome {
            session,
            events,
            candidate: AdjudicationCandidate {
                session_id,
                item_id: closed.item_id,
                bid_id: best.as_ref().map(|bid| bid.id),
                bidder: best.as_ref().map(|bid| bid.bidder.clone()),
                amount: best.as_ref().map(|bid| bid.amount),
            },
            system_message: "Item dispute ended. The best bid is on record.".to_string(),
            session_closed: closed.session_closed,
        })
    }

    /// Durable mirror and fan-out of a closed item, after the lock release.
    pub(super) async fn finish_close(&self, outcome: CloseOutcome) -> Result<(), RestError> {
        let session_id = outcome.session.id;
        self.repo.persist_session(&outcome.session).await?;
        self.audit.persist_events(&outcome.events).await?;
        self.send_system_message(session_id, outcome.system_message)
            .await;
        if let Err(e) = self
            .event_sender
            .send(UpdateEvent::AdjudicationCandidate(outcome.candidate))
        {
            tracing::trace!(error = ?e, "No subscriber for adjudication candidate");
        }
        self.broadcast_state(session_id).await;
        if outcome.session_closed {
            self.teardown_session(session_id).await;
        }
        Ok(())
    }
}
