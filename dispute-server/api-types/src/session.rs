use {
    crate::bid::BidId,
    rust_decimal::Decimal,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::Display,
    time::OffsetDateTime,
    utoipa::ToSchema,
    uuid::Uuid,
};

pub type SessionId = Uuid;
pub type ProcurementId = Uuid;
pub type ItemId = Uuid;
pub type EventId = Uuid;
pub type ChatMessageId = Uuid;

/// Coarse machine state of a dispute session.
#[derive(Serialize, Deserialize, ToSchema, Display, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    AwaitingStart,
    Running,
    RandomClosingWindow,
    Closed,
    Suspended,
    Cancelled,
}

/// Finer legal-workflow stage of the procurement proceeding. Advanced by the
/// surrounding system; the dispute engine only reads it.
#[derive(Serialize, Deserialize, ToSchema, Display, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Opening,
    ProposalAnalysis,
    Bidding,
    Negotiation,
    Habilitation,
    Appeal,
    Adjudication,
    Closing,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Auctioneer,
    Bidder,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemDisputeStatus {
    Awaiting,
    InDispute,
    Closed,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CreateSessionItem {
    /// Item id in the surrounding procurement record.
    #[schema(value_type = String)]
    pub id:              ItemId,
    pub number:          i32,
    pub description:     String,
    #[schema(example = "50", value_type = String)]
    pub quantity:        Decimal,
    pub unit:            String,
    #[schema(example = "4500.00", value_type = String)]
    pub reference_price: Decimal,
}

/// Inbound "procurement record confirmed ready for dispute" event.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CreateSession {
    #[schema(value_type = String)]
    pub procurement_id:          ProcurementId,
    pub auctioneer_name:         String,
    pub items:                   Vec<CreateSessionItem>,
    /// Seconds of inactivity before the random closing window opens.
    pub inactivity_timeout_secs: Option<u64>,
    pub random_window_min_secs:  Option<u64>,
    pub random_window_max_secs:  Option<u64>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct StartItem {
    #[schema(value_type = String)]
    pub item_id: ItemId,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct SuspendSession {
    pub reason: String,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CancelSession {
    pub reason: String,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct AdvancePhase {
    pub phase: SessionPhase,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct ItemSnapshot {
    #[schema(value_type = String)]
    pub id:              ItemId,
    pub number:          i32,
    pub description:     String,
    #[schema(value_type = String)]
    pub quantity:        Decimal,
    pub unit:            String,
    #[schema(value_type = String)]
    pub reference_price: Decimal,
    pub status:          ItemDisputeStatus,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct RankedBid {
    #[schema(value_type = String)]
    pub id:           BidId,
    /// Masked bidder handle; real identities are never broadcast mid-dispute.
    pub bidder_label: String,
    #[schema(example = "4350.00", value_type = String)]
    pub amount:       Decimal,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub placed_at:    OffsetDateTime,
    pub rank:         usize,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct ParticipantInfo {
    pub participant_id: String,
    pub display_label:  String,
    pub role:           ParticipantRole,
    pub online:         bool,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatSenderRole {
    Auctioneer,
    Bidder,
    System,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct ChatMessage {
    #[schema(value_type = String)]
    pub id:           ChatMessageId,
    #[schema(value_type = String)]
    pub session_id:   SessionId,
    pub sender_label: String,
    pub sender_role:  ChatSenderRole,
    pub body:         String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub sent_at:      OffsetDateTime,
}

/// Full externally visible state of a session, recomputed and fanned out to
/// every connected participant after each mutation.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct SessionSnapshot {
    #[schema(value_type = String)]
    pub session_id:       SessionId,
    #[schema(value_type = String)]
    pub procurement_id:   ProcurementId,
    pub auctioneer_name:  String,
    pub status:           SessionStatus,
    pub phase:            SessionPhase,
    #[schema(value_type = Option<String>)]
    pub current_item_id:  Option<ItemId>,
    pub remaining_secs:   Option<u64>,
    pub in_random_window: bool,
    pub extensions_used:  u32,
    pub items:            Vec<ItemSnapshot>,
    pub bids:             Vec<RankedBid>,
    pub participants:     Vec<ParticipantInfo>,
    pub messages:         Vec<ChatMessage>,
}

/// Lightweight once-per-second update carrying only the countdown.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct TickUpdate {
    #[schema(value_type = String)]
    pub session_id:       SessionId,
    pub remaining_secs:   Option<u64>,
    pub in_random_window: bool,
}

/// Winning-bid reference emitted when an item dispute ends, for the
/// adjudication workflow of the surrounding system to pick up.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct AdjudicationCandidate {
    #[schema(value_type = String)]
    pub session_id: SessionId,
    #[schema(value_type = String)]
    pub item_id:    ItemId,
    #[schema(value_type = Option<String>)]
    pub bid_id:     Option<BidId>,
    pub bidder:     Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount:     Option<Decimal>,
}

#[derive(Serialize, Deserialize, ToSchema, Display, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
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

/// One entry of the electronic minutes of a session.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct SessionEvent {
    #[schema(value_type = String)]
    pub id:          EventId,
    #[schema(value_type = String)]
    pub session_id:  SessionId,
    pub kind:        EventKind,
    pub description: String,
    #[schema(value_type = Option<String>)]
    pub item_id:     Option<ItemId>,
    pub bidder:      Option<String>,
    #[schema(value_type = Option<String>)]
    pub bid_id:      Option<BidId>,
    #[schema(value_type = Option<String>)]
    pub amount:      Option<Decimal>,
    /// "SYSTEM" for automatic events, otherwise the acting user's name.
    pub actor:       String,
    #[schema(value_type = Option<Object>)]
    pub payload:     Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub occurred_at: OffsetDateTime,
}
