use {
    crate::kernel::entities::{
        BidderHandle,
        ItemId,
        SessionId,
    },
    rust_decimal::Decimal,
    std::fmt::{
        Display,
        Formatter,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type BidId = Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:         BidId,
    pub session_id: SessionId,
    pub item_id:    ItemId,
    pub bidder:     BidderHandle,
    pub amount:     Decimal,
    /// Network address the bid was submitted from, kept for the record.
    pub origin:     Option<String>,
    pub cancelled:  bool,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct BidCreate {
    pub session_id: SessionId,
    pub item_id:    ItemId,
    pub bidder:     BidderHandle,
    pub amount:     Decimal,
    pub origin:     Option<String>,
}

impl Bid {
    pub fn new(create: BidCreate, now: OffsetDateTime) -> Self {
        Self {
            id:         Uuid::new_v4(),
            session_id: create.session_id,
            item_id:    create.item_id,
            bidder:     create.bidder,
            amount:     create.amount,
            origin:     create.origin,
            cancelled:  false,
            created_at: now,
        }
    }
}

/// Why an incoming bid was refused. Reported only to the submitting
/// participant, carrying the bound the bid failed to beat.
#[derive(Clone, Debug, PartialEq)]
pub enum BidRejectionReason {
    SessionNotOpen,
    WrongItem,
    NotImproving { best: Decimal },
    NotSelfImproving { last: Decimal },
}

impl Display for BidRejectionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BidRejectionReason::SessionNotOpen => {
                write!(f, "The session is not open for bids")
            }
            BidRejectionReason::WrongItem => {
                write!(f, "This item is not currently in dispute")
            }
            BidRejectionReason::NotImproving { best } => {
                write!(f, "The bid must be lower than the current best bid (R$ {best})")
            }
            BidRejectionReason::NotSelfImproving { last } => {
                write!(f, "The bid must be lower than your previous bid (R$ {last})")
            }
        }
    }
}
