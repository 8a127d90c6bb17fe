use {
    crate::kernel::entities::{
        ItemId,
        ProcurementId,
        SessionId,
    },
    dispute_api_types::session as api_session,
    rust_decimal::Decimal,
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fmt::{
            Display,
            Formatter,
        },
        sync::Arc,
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::Mutex,
};

/// Serialization primitive for all state-mutating operations on one session.
/// Bid arbitration and timer ticks both take this lock before touching the
/// session or its ledger, so read-modify-write sequences never interleave.
pub type SessionLock = Arc<Mutex<()>>;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    AwaitingStart,
    Running,
    RandomClosingWindow,
    Closed,
    Suspended,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Closed | SessionStatus::Cancelled)
    }

    /// Bids are accepted while running and also inside the random closing
    /// window, where they cause a prorrogation.
    pub fn accepts_bids(&self) -> bool {
        matches!(
            self,
            SessionStatus::Running | SessionStatus::RandomClosingWindow
        )
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
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

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemDisputeStatus {
    Awaiting,
    InDispute,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisputeItem {
    pub id:              ItemId,
    pub number:          i32,
    pub description:     String,
    pub quantity:        Decimal,
    pub unit:            String,
    pub reference_price: Decimal,
    pub dispute_status:  ItemDisputeStatus,
}

/// Parameters of an active random closing window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWindow {
    pub started_at: OffsetDateTime,
    pub duration:   Duration,
}

#[derive(Clone, Debug)]
pub struct SessionTiming {
    pub inactivity_timeout:       Duration,
    pub random_window_min:        Duration,
    pub random_window_max:        Duration,
    pub last_bid_at:              Option<OffsetDateTime>,
    pub random_window_started_at: Option<OffsetDateTime>,
    pub random_window_duration:   Option<Duration>,
    pub extensions_used:          u32,
}

impl SessionTiming {
    pub fn random_window(&self) -> Option<RandomWindow> {
        match (self.random_window_started_at, self.random_window_duration) {
            (Some(started_at), Some(duration)) => Some(RandomWindow {
                started_at,
                duration,
            }),
            _ => None,
        }
    }

    fn clear_random_window(&mut self) {
        self.random_window_started_at = None;
        self.random_window_duration = None;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    InvalidTransition {
        status:    SessionStatus,
        operation: &'static str,
    },
    UnknownItem(ItemId),
    ItemAlreadyClosed(ItemId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTransition { status, operation } => {
                write!(f, "Operation {operation} is not allowed while the session is {status}")
            }
            SessionError::UnknownItem(item_id) => {
                write!(f, "Item {item_id} does not belong to this session")
            }
            SessionError::ItemAlreadyClosed(item_id) => {
                write!(f, "The dispute for item {item_id} has already ended")
            }
        }
    }
}

/// Outcome of closing the item currently in dispute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosedItem {
    pub item_id:        ItemId,
    /// True when no undisputed items remain and the whole session closed.
    pub session_closed: bool,
}

/// One dispute session for a procurement process. All status and timing
/// mutations go through the methods below; callers are expected to hold the
/// session lock while invoking them and writing the result back.
#[derive(Clone, Debug)]
pub struct Session {
    pub id:                SessionId,
    pub procurement_id:    ProcurementId,
    pub auctioneer_name:   String,
    pub status:            SessionStatus,
    pub phase:             SessionPhase,
    pub current_item_id:   Option<ItemId>,
    pub items:             Vec<DisputeItem>,
    pub timing:            SessionTiming,
    pub suspension_reason: Option<String>,
    pub started_at:        Option<OffsetDateTime>,
    pub closed_at:         Option<OffsetDateTime>,
    pub created_at:        OffsetDateTime,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        procurement_id: ProcurementId,
        auctioneer_name: String,
        items: Vec<DisputeItem>,
        inactivity_timeout: Duration,
        random_window_min: Duration,
        random_window_max: Duration,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            procurement_id,
            auctioneer_name,
            status: SessionStatus::AwaitingStart,
            phase: SessionPhase::Opening,
            current_item_id: None,
            items,
            timing: SessionTiming {
                inactivity_timeout,
                random_window_min,
                random_window_max,
                last_bid_at: None,
                random_window_started_at: None,
                random_window_duration: None,
                extensions_used: 0,
            },
            suspension_reason: None,
            started_at: None,
            closed_at: None,
            created_at: now,
        }
    }

    pub fn start(&mut self, now: OffsetDateTime) -> Result<(), SessionError> {
        if self.status != SessionStatus::AwaitingStart {
            return Err(self.invalid("start"));
        }
        self.status = SessionStatus::Running;
        self.phase = SessionPhase::ProposalAnalysis;
        self.started_at = Some(now);
        Ok(())
    }

    /// Puts an item into dispute. Legal while running, both for the first
    /// item and between items.
    pub fn begin_item_dispute(
        &mut self,
        item_id: ItemId,
        now: OffsetDateTime,
    ) -> Result<&DisputeItem, SessionError> {
        if self.status != SessionStatus::Running || self.current_item_id.is_some() {
            return Err(self.invalid("begin_item_dispute"));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(SessionError::UnknownItem(item_id))?;
        if item.dispute_status == ItemDisputeStatus::Closed {
            return Err(SessionError::ItemAlreadyClosed(item_id));
        }
        item.dispute_status = ItemDisputeStatus::InDispute;
        self.current_item_id = Some(item_id);
        self.phase = SessionPhase::Bidding;
        self.timing.clear_random_window();
        self.timing.last_bid_at = Some(now);
        Ok(self
            .items
            .iter()
            .find(|item| item.id == item_id)
            .expect("item was just found"))
    }

    /// Restarts the inactivity clock after an accepted bid. Returns true when
    /// an active random closing window was cleared, i.e. the bid caused a
    /// prorrogation.
    pub fn record_bid(&mut self, now: OffsetDateTime) -> Result<bool, SessionError> {
        if !self.status.accepts_bids() {
            return Err(self.invalid("record_bid"));
        }
        let extended = if self.status == SessionStatus::RandomClosingWindow {
            self.timing.clear_random_window();
            self.timing.extensions_used += 1;
            self.status = SessionStatus::Running;
            true
        } else {
            false
        };
        self.timing.last_bid_at = Some(now);
        Ok(extended)
    }

    /// Opens the random closing window. Idempotent: a second call while the
    /// window is active returns the existing parameters unchanged, which
    /// guards against double entry from racing timer ticks.
    pub fn enter_random_window(
        &mut self,
        duration: Duration,
        now: OffsetDateTime,
    ) -> Result<RandomWindow, SessionError> {
        if let Some(window) = self.timing.random_window() {
            return Ok(window);
        }
        if self.status != SessionStatus::Running || self.current_item_id.is_none() {
            return Err(self.invalid("enter_random_window"));
        }
        self.status = SessionStatus::RandomClosingWindow;
        self.timing.random_window_started_at = Some(now);
        self.timing.random_window_duration = Some(duration);
        Ok(RandomWindow {
            started_at: now,
            duration,
        })
    }

    /// Ends the dispute of the current item. The session returns to `Running`
    /// when undisputed items remain, otherwise it closes.
    pub fn close_current_item(&mut self, now: OffsetDateTime) -> Result<ClosedItem, SessionError> {
        if !self.status.accepts_bids() {
            return Err(self.invalid("close_current_item"));
        }
        let item_id = self
            .current_item_id
            .ok_or_else(|| self.invalid("close_current_item"))?;
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            item.dispute_status = ItemDisputeStatus::Closed;
        }
        self.current_item_id = None;
        self.timing.clear_random_window();
        self.timing.last_bid_at = None;
        let session_closed = !self.has_awaiting_items();
        if session_closed {
            self.status = SessionStatus::Closed;
            self.phase = SessionPhase::Closing;
            self.closed_at = Some(now);
        } else {
            self.status = SessionStatus::Running;
        }
        Ok(ClosedItem {
            item_id,
            session_closed,
        })
    }

    /// Suspends the session. An active random closing window is discarded and
    /// must be re-rolled after resumption, per the restart-the-clock rule.
    /// Returns true when a window was discarded.
    pub fn suspend(&mut self, reason: String) -> Result<bool, SessionError> {
        if !self.status.accepts_bids() {
            return Err(self.invalid("suspend"));
        }
        let window_discarded = self.timing.random_window().is_some();
        self.timing.clear_random_window();
        self.status = SessionStatus::Suspended;
        self.suspension_reason = Some(reason);
        Ok(window_discarded)
    }

    /// Resumes a suspended session. The inactivity clock restarts from zero.
    pub fn resume(&mut self, now: OffsetDateTime) -> Result<(), SessionError> {
        if self.status != SessionStatus::Suspended {
            return Err(self.invalid("resume"));
        }
        self.status = SessionStatus::Running;
        self.suspension_reason = None;
        if self.current_item_id.is_some() {
            self.timing.last_bid_at = Some(now);
        }
        Ok(())
    }

    pub fn cancel(&mut self, now: OffsetDateTime) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.timing.clear_random_window();
        self.current_item_id = None;
        self.status = SessionStatus::Cancelled;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn advance_phase(&mut self, phase: SessionPhase) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(self.invalid("advance_phase"));
        }
        self.phase = phase;
        Ok(())
    }

    pub fn has_awaiting_items(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.dispute_status == ItemDisputeStatus::Awaiting)
    }

    /// Elapsed wall-clock since the last accepted bid (or the start of the
    /// item dispute when no bid arrived yet).
    pub fn inactive_for(&self, now: OffsetDateTime) -> Option<Duration> {
        let last = self.timing.last_bid_at?;
        (now - last).try_into().ok()
    }

    /// Remaining seconds shown on the participants' countdown. While running
    /// this is the inactivity budget; inside the window, the sampled time
    /// left until automatic closure.
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        match self.status {
            SessionStatus::Running => {
                let elapsed = self.inactive_for(now)?;
                Some(self.timing.inactivity_timeout.saturating_sub(elapsed))
            }
            SessionStatus::RandomClosingWindow => {
                let window = self.timing.random_window()?;
                let elapsed: Duration = (now - window.started_at).try_into().ok()?;
                Some(window.duration.saturating_sub(elapsed))
            }
            _ => None,
        }
    }

    pub fn in_random_window(&self) -> bool {
        self.status == SessionStatus::RandomClosingWindow
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            status: self.status,
            operation,
        }
    }
}

impl From<SessionStatus> for api_session::SessionStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::AwaitingStart => api_session::SessionStatus::AwaitingStart,
            SessionStatus::Running => api_session::SessionStatus::Running,
            SessionStatus::RandomClosingWindow => api_session::SessionStatus::RandomClosingWindow,
            SessionStatus::Closed => api_session::SessionStatus::Closed,
            SessionStatus::Suspended => api_session::SessionStatus::Suspended,
            SessionStatus::Cancelled => api_session::SessionStatus::Cancelled,
        }
    }
}

impl From<SessionPhase> for api_session::SessionPhase {
    fn from(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Opening => api_session::SessionPhase::Opening,
            SessionPhase::ProposalAnalysis => api_session::SessionPhase::ProposalAnalysis,
            SessionPhase::Bidding => api_session::SessionPhase::Bidding,
            SessionPhase::Negotiation => api_session::SessionPhase::Negotiation,
            SessionPhase::Habilitation => api_session::SessionPhase::Habilitation,
            SessionPhase::Appeal => api_session::SessionPhase::Appeal,
            SessionPhase::Adjudication => api_session::SessionPhase::Adjudication,
            SessionPhase::Closing => api_session::SessionPhase::Closing,
        }
    }
}

impl From<api_session::SessionPhase> for SessionPhase {
    fn from(phase: api_session::SessionPhase) -> Self {
        match phase {
            api_session::SessionPhase::Opening => SessionPhase::Opening,
            api_session::SessionPhase::ProposalAnalysis => SessionPhase::ProposalAnalysis,
            api_session::SessionPhase::Bidding => SessionPhase::Bidding,
            api_session::SessionPhase::Negotiation => SessionPhase::Negotiation,
            api_session::SessionPhase::Habilitation => SessionPhase::Habilitation,
            api_session::SessionPhase::Appeal => SessionPhase::Appeal,
            api_session::SessionPhase::Adjudication => SessionPhase::Adjudication,
            api_session::SessionPhase::Closing => SessionPhase::Closing,
        }
    }
}

impl From<ItemDisputeStatus> for api_session::ItemDisputeStatus {
    fn from(status: ItemDisputeStatus) -> Self {
        match status {
            ItemDisputeStatus::Awaiting => api_session::ItemDisputeStatus::Awaiting,
            ItemDisputeStatus::InDispute => api_session::ItemDisputeStatus::InDispute,
            ItemDisputeStatus::Closed => api_session::ItemDisputeStatus::Closed,
        }
    }
}

impl From<&DisputeItem> for api_session::ItemSnapshot {
    fn from(item: &DisputeItem) -> Self {
        api_session::ItemSnapshot {
            id:              item.id,
            number:          item.number,
            description:     item.description.clone(),
            quantity:        item.quantity,
            unit:            item.unit.clone(),
            reference_price: item.reference_price,
            status:          item.dispute_status.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        rust_decimal_macros::dec,
        uuid::Uuid,
    };

    fn test_items(count: i32) -> Vec<DisputeItem> {
        (1..=count)
            .map(|number| DisputeItem {
                id:              Uuid::new_v4(),
                number,
                description:     format!("Item {number}"),
                quantity:        dec!(10),
                unit:            "UN".to_string(),
                reference_price: dec!(100.00),
                dispute_status:  ItemDisputeStatus::Awaiting,
            })
            .collect()
    }

    fn test_session(items: Vec<DisputeItem>) -> Session {
        Session::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Maria Silva".to_string(),
            items,
            Duration::from_secs(180),
            Duration::from_secs(120),
            Duration::from_secs(1800),
            OffsetDateTime::now_utc(),
        )
    }

    fn running_session_with_item(items: Vec<DisputeItem>) -> (Session, ItemId) {
        let now = OffsetDateTime::now_utc();
        let mut session = test_session(items);
        session.start(now).unwrap();
        let item_id = session.items[0].id;
        session.begin_item_dispute(item_id, now).unwrap();
        (session, item_id)
    }

    #[test]
    fn test_start_from_awaiting_start() {
        let mut session = test_session(test_items(1));
        let now = OffsetDateTime::now_utc();
        session.start(now).unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.started_at, Some(now));
    }

    #[test]
    fn test_start_twice_is_invalid() {
        let mut session = test_session(test_items(1));
        let now = OffsetDateTime::now_utc();
        session.start(now).unwrap();
        assert_eq!(
            session.start(now),
            Err(SessionError::InvalidTransition {
                status:    SessionStatus::Running,
                operation: "start",
            })
        );
    }

    #[test]
    fn test_begin_item_dispute_sets_clock_and_item() {
        let (session, item_id) = running_session_with_item(test_items(2));
        assert_eq!(session.current_item_id, Some(item_id));
        assert_eq!(session.items[0].dispute_status, ItemDisputeStatus::InDispute);
        assert!(session.timing.last_bid_at.is_some());
        assert_eq!(session.phase, SessionPhase::Bidding);
    }

    #[test]
    fn test_begin_item_dispute_unknown_item() {
        let mut session = test_session(test_items(1));
        let now = OffsetDateTime::now_utc();
        session.start(now).unwrap();
        let bogus = Uuid::new_v4();
        assert_eq!(
            session.begin_item_dispute(bogus, now),
            Err(SessionError::UnknownItem(bogus))
        );
    }

    #[test]
    fn test_enter_random_window_is_idempotent() {
        let (mut session, _) = running_session_with_item(test_items(1));
        let now = OffsetDateTime::now_utc();
        let window = session
            .enter_random_window(Duration::from_secs(600), now)
            .unwrap();
        let again = session
            .enter_random_window(Duration::from_secs(60), now + time::Duration::seconds(5))
            .unwrap();
        assert_eq!(window, again);
        assert_eq!(session.status, SessionStatus::RandomClosingWindow);
        assert_eq!(session.timing.extensions_used, 0);
    }

    #[test]
    fn test_window_fields_are_both_set_or_both_null() {
        let (mut session, _) = running_session_with_item(test_items(1));
        let now = OffsetDateTime::now_utc();
        assert!(session.timing.random_window_started_at.is_none());
        assert!(session.timing.random_window_duration.is_none());
        session
            .enter_random_window(Duration::from_secs(600), now)
            .unwrap();
        assert!(session.timing.random_window_started_at.is_some());
        assert!(session.timing.random_window_duration.is_some());
        session.record_bid(now).unwrap();
        assert!(session.timing.random_window_started_at.is_none());
        assert!(session.timing.random_window_duration.is_none());
    }

    #[test]
    fn test_bid_during_window_extends_exactly_once() {
        let (mut session, _) = running_session_with_item(test_items(1));
        let now = OffsetDateTime::now_utc();
        session
            .enter_random_window(Duration::from_secs(600), now)
            .unwrap();
        let extended = session.record_bid(now + time::Duration::seconds(10)).unwrap();
        assert!(extended);
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.timing.extensions_used, 1);
        let extended = session.record_bid(now + time::Duration::seconds(20)).unwrap();
        assert!(!extended);
        assert_eq!(session.timing.extensions_used, 1);
    }

    #[test]
    fn test_close_last_item_closes_session() {
        let (mut session, item_id) = running_session_with_item(test_items(1));
        let now = OffsetDateTime::now_utc();
        let closed = session.close_current_item(now).unwrap();
        assert_eq!(closed.item_id, item_id);
        assert!(closed.session_closed);
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.current_item_id, None);
    }

    #[test]
    fn test_close_item_with_remaining_items_returns_to_running() {
        let (mut session, _) = running_session_with_item(test_items(2));
        let now = OffsetDateTime::now_utc();
        let closed = session.close_current_item(now).unwrap();
        assert!(!closed.session_closed);
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.current_item_id, None);
        let next_item = session.items[1].id;
        session.begin_item_dispute(next_item, now).unwrap();
        assert_eq!(session.current_item_id, Some(next_item));
    }

    #[test]
    fn test_closed_item_cannot_be_disputed_again() {
        let (mut session, item_id) = running_session_with_item(test_items(2));
        let now = OffsetDateTime::now_utc();
        session.close_current_item(now).unwrap();
        assert_eq!(
            session.begin_item_dispute(item_id, now),
            Err(SessionError::ItemAlreadyClosed(item_id))
        );
    }

    #[test]
    fn test_suspend_mid_window_discards_window() {
        let (mut session, _) = running_session_with_item(test_items(1));
        let now = OffsetDateTime::now_utc();
        session
            .enter_random_window(Duration::from_secs(600), now)
            .unwrap();
        let discarded = session.suspend("network outage".to_string()).unwrap();
        assert!(discarded);
        assert_eq!(session.status, SessionStatus::Suspended);
        assert!(session.timing.random_window().is_none());
    }

    #[test]
    fn test_resume_restarts_inactivity_clock() {
        let (mut session, _) = running_session_with_item(test_items(1));
        let suspended_at = OffsetDateTime::now_utc();
        session.suspend("lunch break".to_string()).unwrap();
        let resumed_at = suspended_at + time::Duration::seconds(3600);
        session.resume(resumed_at).unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.timing.last_bid_at, Some(resumed_at));
        assert_eq!(
            session.remaining(resumed_at),
            Some(session.timing.inactivity_timeout)
        );
    }

    #[test]
    fn test_resume_requires_suspended() {
        let (mut session, _) = running_session_with_item(test_items(1));
        assert!(matches!(
            session.resume(OffsetDateTime::now_utc()),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_is_reachable_from_any_non_terminal_state() {
        let now = OffsetDateTime::now_utc();
        let mut awaiting = test_session(test_items(1));
        awaiting.cancel(now).unwrap();
        assert_eq!(awaiting.status, SessionStatus::Cancelled);

        let (mut windowed, _) = running_session_with_item(test_items(1));
        windowed
            .enter_random_window(Duration::from_secs(600), now)
            .unwrap();
        windowed.cancel(now).unwrap();
        assert_eq!(windowed.status, SessionStatus::Cancelled);

        let mut closed = test_session(test_items(1));
        closed.status = SessionStatus::Closed;
        assert!(closed.cancel(now).is_err());
    }

    #[test]
    fn test_remaining_counts_down_while_running() {
        let (mut session, _) = running_session_with_item(test_items(1));
        let now = OffsetDateTime::now_utc();
        session.timing.last_bid_at = Some(now);
        assert_eq!(
            session.remaining(now + time::Duration::seconds(60)),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            session.remaining(now + time::Duration::seconds(500)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_bids_rejected_outside_open_states() {
        let now = OffsetDateTime::now_utc();
        let mut session = test_session(test_items(1));
        assert!(session.record_bid(now).is_err());
        session.start(now).unwrap();
        let item_id = session.items[0].id;
        session.begin_item_dispute(item_id, now).unwrap();
        session.suspend("incident".to_string()).unwrap();
        assert!(session.record_bid(now).is_err());
    }
}
