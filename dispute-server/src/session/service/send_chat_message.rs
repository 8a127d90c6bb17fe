use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        kernel::entities::{
            SessionId,
            AUCTIONEER_LABEL,
            SUPPLIER_LABEL,
            SYSTEM_LABEL,
        },
        session::entities,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

#[derive(Clone, Debug)]
pub struct SendChatMessageInput {
    pub session_id:  SessionId,
    pub sender_role: entities::ChatSenderRole,
    pub body:        String,
}

impl Service {
    /// Chat sender identities are anonymized at the door: all bidders share
    /// one label during the dispute, the auctioneer keeps a fixed one.
    #[tracing::instrument(skip_all, fields(session_id = %input.session_id), err(level = tracing::Level::TRACE))]
    pub async fn send_chat_message(
        &self,
        input: SendChatMessageInput,
    ) -> Result<entities::ChatMessage, RestError> {
        self.get_in_memory_session(input.session_id).await?;
        let sender_label = match input.sender_role {
            entities::ChatSenderRole::Auctioneer => AUCTIONEER_LABEL,
            entities::ChatSenderRole::Bidder => SUPPLIER_LABEL,
            entities::ChatSenderRole::System => SYSTEM_LABEL,
        };
        let message = entities::ChatMessage {
            id:           Uuid::new_v4(),
            session_id:   input.session_id,
            sender_label: sender_label.to_string(),
            sender_role:  input.sender_role,
            body:         input.body,
            sent_at:      OffsetDateTime::now_utc(),
        };
        let message = self.repo.add_chat_message(message).await?;
        if let Err(e) = self
            .event_sender
            .send(UpdateEvent::NewChatMessage((&message).into()))
        {
            tracing::trace!(error = ?e, "No subscriber for chat message");
        }
        Ok(message)
    }

    /// Chat notices the engine itself produces (window opened, item closed).
    /// Failures are logged and swallowed: chat is not the legal record, and a
    /// timer transition must not fail because of it.
    pub(crate) async fn send_system_message(&self, session_id: SessionId, body: String) {
        if let Err(e) = self
            .send_chat_message(SendChatMessageInput {
                session_id,
                sender_role: entities::ChatSenderRole::System,
                body,
            })
            .await
        {
            tracing::warn!(session_id = %session_id, error = ?e, "Failed to record system chat message");
        }
    }
}
