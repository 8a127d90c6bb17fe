use {
    super::Service,
    crate::{
        api::RestError,
        audit::{
            entities::{
                Actor,
                AuditEvent,
                EventKind,
            },
            service::append_event::AppendEventInput,
        },
        bid::entities,
        session::entities::{
            Session,
            SessionLock,
        },
    },
    time::OffsetDateTime,
};

pub struct SubmitBidInput {
    pub bid_create: entities::BidCreate,
}

impl Service {
    /// Validates and commits a bid. The in-memory decision (ledger read,
    /// improvement checks, ledger append, timer reset) happens under the
    /// session lock; the durable mirror is awaited after release, and a
    /// mirror failure unwinds the bid so it is never reported as committed.
    #[tracing::instrument(
        skip_all,
        fields(bid_id, session_id = %input.bid_create.session_id),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn submit_bid(&self, input: SubmitBidInput) -> Result<entities::Bid, RestError> {
        let session_id = input.bid_create.session_id;
        let lock = self.sessions.session_lock(session_id).await?;
        let (bid, session, events) = self.submit_bid_for_lock(input, lock).await?;
        tracing::Span::current().record("bid_id", bid.id.to_string());

        let mirrored = self.mirror_bid(&bid, &session, &events).await;
        if let Err(e) = mirrored {
            self.repo.remove_in_memory_bid(session_id, bid.id).await;
            self.audit.discard_events(&events).await;
            // The timer reset the bid caused stays in place; time-based state
            // is never rolled backwards.
            tracing::error!(bid_id = %bid.id, "Unwound bid after failed durable write");
            return Err(e);
        }
        self.sessions.broadcast_state(session_id).await;
        Ok(bid)
    }

    async fn submit_bid_for_lock(
        &self,
        input: SubmitBidInput,
        lock: SessionLock,
    ) -> Result<(entities::Bid, Session, Vec<AuditEvent>), RestError> {
        let _guard = lock.lock().await;
        let session_id = input.bid_create.session_id;
        let session = self.sessions.get_in_memory_session(session_id).await?;
        self.verify_bid(&session, &input.bid_create).await?;

        let now = OffsetDateTime::now_utc();
        let bid = entities::Bid::new(input.bid_create, now);
        self.repo.add_in_memory_bid(bid.clone()).await;
        let (extended, session) = self.sessions.record_bid_for_lock(session_id, now).await?;

        let mut events = vec![
            self.audit
                .append_in_memory(
                    AppendEventInput {
                        session_id,
                        kind: EventKind::BidRegistered,
                        description: format!("Bid of R$ {} registered", bid.amount),
                        item_id: Some(bid.item_id),
                        bidder: Some(bid.bidder.clone()),
                        bid_id: Some(bid.id),
                        amount: Some(bid.amount),
                        actor: Actor::User(bid.bidder.clone()),
                        payload: None,
                    },
                    now,
                )
                .await,
        ];
        if extended {
            events.push(
                self.audit
                    .append_in_memory(
                        AppendEventInput {
                            session_id,
                            kind: EventKind::ExtensionApplied,
                            description:
                                "Bid during the random closing window extended the dispute"
                                    .to_string(),
                            item_id: Some(bid.item_id),
                            bidder: Some(bid.bidder.clone()),
                            bid_id: Some(bid.id),
                            amount: Some(bid.amount),
                            actor: Actor::System,
                            payload: Some(serde_json::json!({
                                "extensions_used": session.timing.extensions_used,
                            })),
                        },
                        now,
                    )
                    .await,
            );
        }
        Ok((bid, session, events))
    }

    async fn mirror_bid(
        &self,
        bid: &entities::Bid,
        session: &Session,
        events: &[AuditEvent],
    ) -> Result<(), RestError> {
        self.repo.persist_bid(bid).await?;
        self.sessions.persist_session(session).await?;
        self.audit.persist_events(events).await
    }
}
