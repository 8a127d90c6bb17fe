use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        kernel::entities::{
            mask_handle,
            SessionId,
            AUCTIONEER_LABEL,
        },
    },
    dispute_api_types::session as api_session,
    time::OffsetDateTime,
};

/// Chat history is replayed in snapshots up to this depth.
const RECENT_MESSAGES: usize = 100;

impl Service {
    /// Recomputes the full externally visible state of a session. Read-only:
    /// snapshots never mutate, and this path takes no session lock so it can
    /// be called from both the bid path and the timer path without blocking
    /// either.
    #[tracing::instrument(skip_all, fields(session_id = %session_id), err(level = tracing::Level::TRACE))]
    pub async fn get_snapshot(
        &self,
        session_id: SessionId,
    ) -> Result<api_session::SessionSnapshot, RestError> {
        let session = self.get_in_memory_session(session_id).await?;
        let now = OffsetDateTime::now_utc();

        let bids = match session.current_item_id {
            Some(item_id) => self.bids.get_in_memory_ranked_bids(session_id, item_id).await,
            None => Vec::new(),
        };
        let bids = bids
            .iter()
            .enumerate()
            .map(|(index, bid)| api_session::RankedBid {
                id:           bid.id,
                bidder_label: mask_handle(&bid.bidder),
                amount:       bid.amount,
                placed_at:    bid.created_at,
                rank:         index + 1,
            })
            .collect();

        let participants = self
            .store
            .ws
            .get_participants(session_id)
            .await
            .into_iter()
            .map(|participant| {
                let display_label = match participant.role {
                    api_session::ParticipantRole::Auctioneer => AUCTIONEER_LABEL.to_string(),
                    api_session::ParticipantRole::Bidder => mask_handle(&participant.display_name),
                };
                api_session::ParticipantInfo {
                    participant_id: participant.participant_id,
                    display_label,
                    role: participant.role,
                    online: true,
                }
            })
            .collect();

        let messages = self.repo.get_in_memory_chat_messages(session_id).await;
        let messages = messages
            .iter()
            .rev()
            .take(RECENT_MESSAGES)
            .rev()
            .map(api_session::ChatMessage::from)
            .collect();

        Ok(api_session::SessionSnapshot {
            session_id,
            procurement_id: session.procurement_id,
            auctioneer_name: session.auctioneer_name.clone(),
            status: session.status.into(),
            phase: session.phase.into(),
            current_item_id: session.current_item_id,
            remaining_secs: session.remaining(now).map(|remaining| remaining.as_secs()),
            in_random_window: session.in_random_window(),
            extensions_used: session.timing.extensions_used,
            items: session.items.iter().map(api_session::ItemSnapshot::from).collect(),
            bids,
            participants,
            messages,
        })
    }

    /// Fans the current snapshot out to every participant of the session.
    /// Every mutating operation ends here.
    pub async fn broadcast_state(&self, session_id: SessionId) {
        match self.get_snapshot(session_id).await {
            Ok(snapshot) => {
                if let Err(e) = self.event_sender.send(UpdateEvent::StateSnapshot(snapshot)) {
                    tracing::trace!(error = ?e, "No subscriber for state snapshot");
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = ?e, "Failed to build session snapshot");
            }
        }
    }
}
