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
        bid::entities,
        kernel::entities::SessionId,
    },
    time::OffsetDateTime,
};

#[derive(Clone, Debug)]
pub struct CancelBidInput {
    pub session_id:    SessionId,
    pub bid_id:        entities::BidId,
    /// Recorded verbatim in the minutes; cancelling without a reason is not
    /// a thing the law allows.
    pub justification: String,
    pub actor:         String,
}

impl Service {
    /// Auctioneer-only. The cancelled bid stops counting toward "current
    /// best" and "bidder's last" on the next query; the ordering of the
    /// remaining bids is not re-validated.
    #[tracing::instrument(
        skip_all,
        fields(session_id = %input.session_id, bid_id = %input.bid_id),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn cancel_bid(&self, input: CancelBidInput) -> Result<(), RestError> {
        let lock = self.sessions.session_lock(input.session_id).await?;
        let (bid, event) = {
            let _guard = lock.lock().await;
            let bid = self
                .repo
                .cancel_in_memory_bid(input.session_id, input.bid_id)
                .await
                .ok_or(RestError::BidNotFound)?;
            let now = OffsetDateTime::now_utc();
            let event = self
                .audit
                .append_in_memory(
                    AppendEventInput {
                        session_id: input.session_id,
                        kind: EventKind::BidCancelled,
                        description: format!(
                            "Bid of R$ {} cancelled by the auctioneer. Justification: {}",
                            bid.amount, input.justification
                        ),
                        item_id: Some(bid.item_id),
                        bidder: Some(bid.bidder.clone()),
                        bid_id: Some(bid.id),
                        amount: Some(bid.amount),
                        actor: Actor::User(input.actor),
                        payload: Some(serde_json::json!({
                            "justification": input.justification,
                        })),
                    },
                    now,
                )
                .await;
            (bid, event)
        };
        self.repo.persist_bid_cancellation(bid.id).await?;
        self.audit.persist_events(&[event]).await?;
        self.sessions
            .send_system_message(
                input.session_id,
                format!(
                    "Bid cancelled by the auctioneer. Reason: {}",
                    input.justification
                ),
            )
            .await;
        self.sessions.broadcast_state(input.session_id).await;
        Ok(())
    }
}
