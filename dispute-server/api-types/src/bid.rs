use {
    crate::session::{
        ItemId,
        SessionId,
    },
    rust_decimal::Decimal,
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type BidId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct BidCreate {
    #[schema(value_type = String)]
    pub session_id: SessionId,
    #[schema(value_type = String)]
    pub item_id:    ItemId,
    /// Pseudonymous bidder handle; never the supplier's real identity.
    pub bidder:     String,
    #[schema(example = "4350.00", value_type = String)]
    pub amount:     Decimal,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct BidResult {
    pub status: String,
    /// The id of the accepted bid.
    #[schema(value_type = String)]
    pub id:     BidId,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct BidCancel {
    #[schema(value_type = String)]
    pub session_id:    SessionId,
    #[schema(value_type = String)]
    pub bid_id:        BidId,
    /// Recorded verbatim in the electronic minutes.
    pub justification: String,
}
