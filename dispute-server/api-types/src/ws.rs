use {
    crate::{
        bid::{
            BidCancel,
            BidCreate,
            BidResult,
        },
        session::{
            AdjudicationCandidate,
            ChatMessage,
            ItemId,
            ParticipantRole,
            SessionEvent,
            SessionId,
            SessionSnapshot,
            TickUpdate,
        },
    },
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::ToSchema,
};

#[derive(Deserialize, Clone, ToSchema, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join {
        #[schema(value_type = String)]
        session_id:     SessionId,
        participant_id: String,
        display_name:   String,
        role:           ParticipantRole,
    },
    #[serde(rename = "leave")]
    Leave {
        #[schema(value_type = String)]
        session_id: SessionId,
    },
    #[serde(rename = "submit_bid")]
    SubmitBid { bid: BidCreate },
    #[serde(rename = "cancel_bid")]
    CancelBid { data: BidCancel },
    #[serde(rename = "start_item")]
    StartItem {
        #[schema(value_type = String)]
        session_id: SessionId,
        #[schema(value_type = String)]
        item_id:    ItemId,
    },
    #[serde(rename = "close_item")]
    CloseItem {
        #[schema(value_type = String)]
        session_id: SessionId,
    },
    #[serde(rename = "suspend")]
    Suspend {
        #[schema(value_type = String)]
        session_id: SessionId,
        reason:     String,
    },
    #[serde(rename = "resume")]
    Resume {
        #[schema(value_type = String)]
        session_id: SessionId,
    },
    #[serde(rename = "chat")]
    Chat {
        #[schema(value_type = String)]
        session_id: SessionId,
        body:       String,
    },
}

#[derive(Deserialize, Clone, ToSchema, Serialize)]
pub struct ClientRequest {
    pub id:  String,
    #[serde(flatten)]
    pub msg: ClientMessage,
}

/// This enum is used to send an update to the client for any session joined.
#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "type")]
#[allow(clippy::large_enum_variant)]
pub enum ServerUpdateResponse {
    #[serde(rename = "state_snapshot")]
    StateSnapshot { snapshot: SessionSnapshot },
    #[serde(rename = "tick")]
    Tick { update: TickUpdate },
    #[serde(rename = "event")]
    Event { event: SessionEvent },
    #[serde(rename = "chat_message")]
    ChatMessage { message: ChatMessage },
    #[serde(rename = "adjudication_candidate")]
    AdjudicationCandidate { candidate: AdjudicationCandidate },
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(untagged)]
pub enum APIResponse {
    BidResult(BidResult),
    Snapshot(SessionSnapshot),
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "status", content = "result")]
pub enum ServerResultMessage {
    #[serde(rename = "success")]
    Success(Option<APIResponse>),
    #[serde(rename = "error")]
    Err(String),
}

/// This enum is used to send the result for a specific client request with the same id.
/// Id is only None when the client message is invalid.
#[derive(Serialize, ToSchema, Deserialize, Clone, Debug)]
pub struct ServerResultResponse {
    pub id:     Option<String>,
    #[serde(flatten)]
    pub result: ServerResultMessage,
}
