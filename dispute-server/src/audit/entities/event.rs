use {
    crate::{
        bid::entities::BidId,
        kernel::entities::{
            BidderHandle,
            ItemId,
            SessionId,
            SYSTEM_LABEL,
        },
    },
    dispute_api_types::session as api_session,
    rust_decimal::Decimal,
    serde::{
        Deserialize,
        Serialize,
    },
    std::fmt::{
        Display,
        Formatter,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type EventId = Uuid;

/// Closed enumeration of everything that can appear in the electronic
/// minutes of a session.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SessionStarted,
    SessionSuspended,
    SessionResumed,
    SessionClosed,
    SessionCancelled,
    BidRegistered,
    BidCancelled,
    ItemDisputeStarted,
    ItemDisputeEnded,
    RandomWindowStarted,
    ExtensionApplied,
    PhaseAdvanced,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Actor {
    System,
    User(String),
}

impl Display for Actor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::System => write!(f, "{SYSTEM_LABEL}"),
            Actor::User(name) => write!(f, "{name}"),
        }
    }
}

impl Actor {
    pub fn parse(raw: &str) -> Self {
        if raw == SYSTEM_LABEL {
            Actor::System
        } else {
            Actor::User(raw.to_string())
        }
    }
}

/// One append-only entry of a session's audit trail. Never updated or
/// deleted; the per-session timestamp order is the legal minutes order.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub id:          EventId,
    pub session_id:  SessionId,
    pub kind:        EventKind,
    pub description: String,
    pub item_id:     Option<ItemId>,
    pub bidder:      Option<BidderHandle>,
    pub bid_id:      Option<BidId>,
    pub amount:      Option<Decimal>,
    pub actor:       Actor,
    pub payload:     Option<serde_json::Value>,
    pub occurred_at: OffsetDateTime,
}

impl From<EventKind> for api_session::EventKind {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::SessionStarted => api_session::EventKind::SessionStarted,
            EventKind::SessionSuspended => api_session::EventKind::SessionSuspended,
            EventKind::SessionResumed => api_session::EventKind::SessionResumed,
            EventKind::SessionClosed => api_session::EventKind::SessionClosed,
            EventKind::SessionCancelled => api_session::EventKind::SessionCancelled,
            EventKind::BidRegistered => api_session::EventKind::BidRegistered,
            EventKind::BidCancelled => api_session::EventKind::BidCancelled,
            EventKind::ItemDisputeStarted => api_session::EventKind::ItemDisputeStarted,
            EventKind::ItemDisputeEnded => api_session::EventKind::ItemDisputeEnded,
            EventKind::RandomWindowStarted => api_session::EventKind::RandomWindowStarted,
            EventKind::ExtensionApplied => api_session::EventKind::ExtensionApplied,
            EventKind::PhaseAdvanced => api_session::EventKind::PhaseAdvanced,
        }
    }
}

impl From<&AuditEvent> for api_session::SessionEvent {
    fn from(event: &AuditEvent) -> Self {
        api_session::SessionEvent {
            id:          event.id,
            session_id:  event.session_id,
            kind:        event.kind.into(),
            description: event.description.clone(),
            item_id:     event.item_id,
            bidder:      event.bidder.clone(),
            bid_id:      event.bid_id,
            amount:      event.amount,
            actor:       event.actor.to_string(),
            payload:     event.payload.clone(),
            occurred_at: event.occurred_at,
        }
    }
}
