use {
    crate::kernel::entities::SessionId,
    dispute_api_types::session as api_session,
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type ChatMessageId = Uuid;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatSenderRole {
    Auctioneer,
    Bidder,
    System,
}

/// Session chat entry. Chat is kept apart from the legal event trail; it is
/// replayed in snapshots but is not part of the electronic minutes.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub id:           ChatMessageId,
    pub session_id:   SessionId,
    /// Already anonymized at creation; bidder identities never reach here.
    pub sender_label: String,
    pub sender_role:  ChatSenderRole,
    pub body:         String,
    pub sent_at:      OffsetDateTime,
}

impl From<ChatSenderRole> for api_session::ChatSenderRole {
    fn from(role: ChatSenderRole) -> Self {
        match role {
            ChatSenderRole::Auctioneer => api_session::ChatSenderRole::Auctioneer,
            ChatSenderRole::Bidder => api_session::ChatSenderRole::Bidder,
            ChatSenderRole::System => api_session::ChatSenderRole::System,
        }
    }
}

impl From<&ChatMessage> for api_session::ChatMessage {
    fn from(message: &ChatMessage) -> Self {
        api_session::ChatMessage {
            id:           message.id,
            session_id:   message.session_id,
            sender_label: message.sender_label.clone(),
            sender_role:  message.sender_role.into(),
            body:         message.body.clone(),
            sent_at:      message.sent_at,
        }
    }
}
