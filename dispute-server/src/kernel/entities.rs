use uuid::Uuid;

pub type SessionId = Uuid;
pub type ProcurementId = Uuid;
pub type ItemId = Uuid;

/// Pseudonymous supplier identifier. Transparency law requires that bidders
/// stay anonymous to each other for the whole dispute, so this handle is the
/// only identity the engine ever sees.
pub type BidderHandle = String;

/// The auctioneer is always shown under this fixed label, never anonymized.
pub const AUCTIONEER_LABEL: &str = "AUCTIONEER";
pub const SYSTEM_LABEL: &str = "SYSTEM";
/// Chat label shared by every bidder during the dispute.
pub const SUPPLIER_LABEL: &str = "SUPPLIER";

/// Masks a bidder handle for display to other participants. Registration
/// numbers keep only their last four digits; longer free-form handles keep a
/// three-character prefix.
pub fn mask_handle(handle: &str) -> String {
    let chars: Vec<char> = handle.chars().collect();
    if chars.len() >= 14 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("***{tail}")
    } else if chars.len() > 10 {
        let head: String = chars[..3].iter().collect();
        format!("{head}***")
    } else {
        handle.to_string()
    }
}
