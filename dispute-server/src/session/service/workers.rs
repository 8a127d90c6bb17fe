use {
    super::{
        close_item_dispute::{
            CloseOutcome,
            CloseTrigger,
        },
        enter_random_window::WindowOutcome,
        Service,
    },
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        kernel::entities::SessionId,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        session::entities::SessionStatus,
    },
    anyhow::Result,
    dispute_api_types::session::TickUpdate,
    std::{
        sync::atomic::Ordering,
        time::Duration,
    },
    time::OffsetDateTime,
};

enum Transition {
    None,
    Window(WindowOutcome),
    Close(CloseOutcome),
}

impl Service {
    /// The closing-timer coordinator: one shared scheduler visiting every
    /// active session once per tick. Decoupled from the bid path, so a burst
    /// of bids cannot starve the timer and a slow tick cannot block
    /// arbitration; the two only meet at the per-session lock.
    pub async fn run_tick_loop(&self) -> Result<()> {
        tracing::info!("Starting dispute session timer...");
        let mut tick_interval = tokio::time::interval(self.config.tick_interval);
        let mut exit_check_interval = tokio::time::interval(EXIT_CHECK_INTERVAL);
        while !SHOULD_EXIT.load(Ordering::Acquire) {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let now = OffsetDateTime::now_utc();
                    for session_id in self.repo.get_in_memory_active_sessions().await {
                        // A failing session must not take the others down with it.
                        if let Err(e) = self.tick_session(session_id, now).await {
                            tracing::error!(
                                session_id = %session_id,
                                error = ?e,
                                "Session tick failed; retrying next tick"
                            );
                        }
                    }
                }
                _ = exit_check_interval.tick() => {}
            }
        }
        tracing::info!("Shutting down dispute session timer...");
        Ok(())
    }

    /// One timer step for one session. Status is re-read under the lock at
    /// every tick, so a suspension or closure that happened since the scan
    /// cleanly turns the tick into a no-op.
    pub async fn tick_session(
        &self,
        session_id: SessionId,
        now: OffsetDateTime,
    ) -> Result<(), RestError> {
        let lock = match self.session_lock(session_id).await {
            Ok(lock) => lock,
            // Torn down between the scan and this tick.
            Err(RestError::SessionNotFound) => return Ok(()),
            Err(e) => return Err(e),
        };
        let transition = {
            let _guard = lock.lock().await;
            let Some(session) = self.repo.get_in_memory_session(session_id).await else {
                return Ok(());
            };
            match session.status {
                SessionStatus::Running if session.current_item_id.is_some() => {
                    let timed_out = session
                        .inactive_for(now)
                        .map(|elapsed| elapsed >= session.timing.inactivity_timeout)
                        .unwrap_or(false);
                    if timed_out {
                        match self.enter_random_window_for_lock(session_id, now).await? {
                            Some(outcome) => Transition::Window(outcome),
                            None => Transition::None,
                        }
                    } else {
                        Transition::None
                    }
                }
                SessionStatus::RandomClosingWindow => {
                    let expired = session
                        .timing
                        .random_window()
                        .and_then(|window| {
                            let elapsed: Duration = (now - window.started_at).try_into().ok()?;
                            Some(elapsed >= window.duration)
                        })
                        .unwrap_or(false);
                    if expired {
                        Transition::Close(
                            self.close_item_for_lock(session_id, CloseTrigger::Timer, now)
                                .await?,
                        )
                    } else {
                        Transition::None
                    }
                }
                _ => Transition::None,
            }
        };
        match transition {
            Transition::None => {}
            Transition::Window(outcome) => self.finish_window(outcome).await?,
            Transition::Close(outcome) => self.finish_close(outcome).await?,
        }
        if let Some(session) = self.repo.get_in_memory_session(session_id).await {
            let update = TickUpdate {
                session_id,
                remaining_secs: session.remaining(now).map(|remaining| remaining.as_secs()),
                in_random_window: session.in_random_window(),
            };
            if let Err(e) = self.event_sender.send(UpdateEvent::Tick(update)) {
                tracing::trace!(error = ?e, "No subscriber for tick update");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            audit::{
                entities::EventKind,
                repository::MockDatabase as MockAuditDatabase,
            },
            bid::{
                entities::BidCreate,
                repository::MockDatabase as MockBidDatabase,
                service::SubmitBidInput,
            },
            session::{
                entities::{
                    DisputeItem,
                    ItemDisputeStatus,
                },
                repository::MockDatabase as MockSessionDatabase,
                service::{
                    tests::TestServices,
                    BeginItemDisputeInput,
                    CreateSessionInput,
                    MockWindowSampler,
                    Service,
                    StartSessionInput,
                },
            },
        },
        rust_decimal::Decimal,
        rust_decimal_macros::dec,
        std::sync::{
            Arc,
            Mutex,
        },
        uuid::Uuid,
    };

    type CapturedEvents = Arc<Mutex<Vec<(EventKind, String, Option<Decimal>)>>>;

    fn capture_events(audit_db: &mut MockAuditDatabase) -> CapturedEvents {
        let captured: CapturedEvents = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        audit_db.expect_add_event().returning(move |event| {
            sink.lock().unwrap().push((
                event.kind,
                event.description.clone(),
                event.amount,
            ));
            Ok(())
        });
        captured
    }

    fn permissive_session_db() -> MockSessionDatabase {
        let mut session_db = MockSessionDatabase::new();
        session_db.expect_add_session().returning(|_| Ok(()));
        session_db.expect_update_session().returning(|_| Ok(()));
        session_db.expect_add_chat_message().returning(|_| Ok(()));
        session_db
    }

    fn permissive_bid_db() -> MockBidDatabase {
        let mut bid_db = MockBidDatabase::new();
        bid_db.expect_add_bid().returning(|_| Ok(()));
        bid_db.expect_cancel_bid().returning(|_| Ok(()));
        bid_db
    }

    fn test_item() -> DisputeItem {
        DisputeItem {
            id:              Uuid::new_v4(),
            number:          1,
            description:     "Desktop computer".to_string(),
            quantity:        dec!(50),
            unit:            "UN".to_string(),
            reference_price: dec!(4500.00),
            dispute_status:  ItemDisputeStatus::Awaiting,
        }
    }

    async fn create_running_session(
        services: &TestServices,
        items: Vec<DisputeItem>,
    ) -> crate::kernel::entities::SessionId {
        let first_item = items[0].id;
        let session = services
            .session
            .create_session(CreateSessionInput {
                procurement_id:     Uuid::new_v4(),
                auctioneer_name:    "Maria Silva".to_string(),
                items,
                inactivity_timeout: None,
                random_window_min:  None,
                random_window_max:  None,
            })
            .await
            .unwrap();
        services
            .session
            .start_session(StartSessionInput {
                session_id: session.id,
                actor:      "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        services
            .session
            .begin_item_dispute(BeginItemDisputeInput {
                session_id: session.id,
                item_id:    first_item,
                actor:      "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        session.id
    }

    #[tokio::test]
    async fn test_inactivity_enters_window_exactly_once() {
        let mut sampler = MockWindowSampler::new();
        sampler
            .expect_sample_window()
            .times(1)
            .return_const(Duration::from_secs(600));
        let mut audit_db = MockAuditDatabase::new();
        capture_events(&mut audit_db);
        let services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let session_id = create_running_session(&services, vec![test_item()]).await;
        let t0 = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();

        for seconds in [60, 120, 179] {
            services
                .session
                .tick_session(session_id, t0 + time::Duration::seconds(seconds))
                .await
                .unwrap();
            let session = services
                .session
                .get_in_memory_session(session_id)
                .await
                .unwrap();
            assert_eq!(session.status, SessionStatus::Running);
        }

        // The timeout elapses; repeated ticks must transition only once.
        for seconds in [180, 181, 182] {
            services
                .session
                .tick_session(session_id, t0 + time::Duration::seconds(seconds))
                .await
                .unwrap();
        }
        let session = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::RandomClosingWindow);
        assert_eq!(
            session.timing.random_window_duration,
            Some(Duration::from_secs(600))
        );
        assert_eq!(session.timing.extensions_used, 0);
    }

    #[tokio::test]
    async fn test_bid_during_window_applies_prorrogation() {
        let mut sampler = MockWindowSampler::new();
        sampler
            .expect_sample_window()
            .return_const(Duration::from_secs(600));
        let mut audit_db = MockAuditDatabase::new();
        let captured = capture_events(&mut audit_db);
        let services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let item = test_item();
        let item_id = item.id;
        let session_id = create_running_session(&services, vec![item]).await;
        let t0 = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(180))
            .await
            .unwrap();

        // A bid ten seconds into the window clears it and counts an extension.
        services
            .bid
            .submit_bid(SubmitBidInput {
                bid_create: BidCreate {
                    session_id,
                    item_id,
                    bidder: "supplier-a".to_string(),
                    amount: dec!(4000.00),
                    origin: None,
                },
            })
            .await
            .unwrap();
        let session = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.timing.extensions_used, 1);
        assert!(session.timing.random_window().is_none());
        let kinds: Vec<EventKind> = captured.lock().unwrap().iter().map(|e| e.0).collect();
        assert!(kinds.contains(&EventKind::RandomWindowStarted));
        assert!(kinds.contains(&EventKind::ExtensionApplied));
    }

    #[tokio::test]
    async fn test_window_expiry_closes_item_automatically() {
        let mut sampler = MockWindowSampler::new();
        sampler
            .expect_sample_window()
            .return_const(Duration::from_secs(600));
        let mut audit_db = MockAuditDatabase::new();
        let captured = capture_events(&mut audit_db);
        let services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let item = test_item();
        let item_id = item.id;
        let session_id = create_running_session(&services, vec![item]).await;
        services
            .bid
            .submit_bid(SubmitBidInput {
                bid_create: BidCreate {
                    session_id,
                    item_id,
                    bidder: "supplier-a".to_string(),
                    amount: dec!(4000.00),
                    origin: None,
                },
            })
            .await
            .unwrap();
        let t0 = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(180))
            .await
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(180 + 600))
            .await
            .unwrap();

        // Single-item session: the dispute ended and the session closed and
        // was torn down; the minutes reference the winning bid.
        assert!(services
            .session
            .get_in_memory_session(session_id)
            .await
            .is_err());
        let events = captured.lock().unwrap();
        let dispute_ended = events
            .iter()
            .find(|event| event.0 == EventKind::ItemDisputeEnded)
            .expect("dispute ended event missing");
        assert!(dispute_ended.1.contains("automatically by time"));
        assert_eq!(dispute_ended.2, Some(dec!(4000.00)));
        assert!(events
            .iter()
            .any(|event| event.0 == EventKind::SessionClosed));
    }

    #[tokio::test]
    async fn test_multi_item_session_returns_to_running_after_close() {
        let mut sampler = MockWindowSampler::new();
        sampler
            .expect_sample_window()
            .return_const(Duration::from_secs(600));
        let mut audit_db = MockAuditDatabase::new();
        capture_events(&mut audit_db);
        let services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let items = vec![
            test_item(),
            DisputeItem {
                number: 2,
                ..test_item()
            },
        ];
        let second_item = items[1].id;
        let session_id = create_running_session(&services, items).await;
        let t0 = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(180))
            .await
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(180 + 600))
            .await
            .unwrap();

        let session = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.current_item_id, None);

        // The façade starts the next item; the coordinator never does.
        services
            .session
            .begin_item_dispute(BeginItemDisputeInput {
                session_id,
                item_id: second_item,
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        let session = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap();
        assert_eq!(session.current_item_id, Some(second_item));
    }

    #[tokio::test]
    async fn test_suspension_discards_window_and_resume_restarts_clock() {
        let mut sampler = MockWindowSampler::new();
        sampler
            .expect_sample_window()
            .return_const(Duration::from_secs(600));
        let mut audit_db = MockAuditDatabase::new();
        capture_events(&mut audit_db);
        let services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let session_id = create_running_session(&services, vec![test_item()]).await;
        let t0 = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(180))
            .await
            .unwrap();

        services
            .session
            .suspend_session(crate::session::service::SuspendSessionInput {
                session_id,
                reason: "technical incident".to_string(),
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        let session = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Suspended);
        assert!(session.timing.random_window().is_none());

        // Ticks while suspended are no-ops even if scheduled late.
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(10_000))
            .await
            .unwrap();
        assert_eq!(
            services
                .session
                .get_in_memory_session(session_id)
                .await
                .unwrap()
                .status,
            SessionStatus::Suspended
        );

        services
            .session
            .resume_session(session_id, "Maria Silva".to_string())
            .await
            .unwrap();
        let session = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        // The inactivity clock restarted from zero, not from where it was.
        let resumed_at = session.timing.last_bid_at.unwrap();
        assert_eq!(
            session.remaining(resumed_at),
            Some(session.timing.inactivity_timeout)
        );
    }

    #[tokio::test]
    async fn test_tick_failure_is_isolated_per_session() {
        let mut sampler = MockWindowSampler::new();
        sampler
            .expect_sample_window()
            .times(2)
            .return_const(Duration::from_secs(600));
        let failing_session = Arc::new(Mutex::new(None::<crate::kernel::entities::SessionId>));
        let mut audit_db = MockAuditDatabase::new();
        let failing = failing_session.clone();
        audit_db.expect_add_event().returning(move |event| {
            if event.kind == EventKind::RandomWindowStarted
                && Some(event.session_id) == *failing.lock().unwrap()
            {
                return Err(RestError::TemporarilyUnavailable);
            }
            Ok(())
        });
        let services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let session_a = create_running_session(&services, vec![test_item()]).await;
        let session_b = create_running_session(&services, vec![test_item()]).await;
        *failing_session.lock().unwrap() = Some(session_a);

        let t0_a = services
            .session
            .get_in_memory_session(session_a)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();
        let t0_b = services
            .session
            .get_in_memory_session(session_b)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();

        // Drive both sessions the way the coordinator loop does: a failure in
        // one must leave the other free to transition.
        let result_a = services
            .session
            .tick_session(session_a, t0_a + time::Duration::seconds(180))
            .await;
        let result_b = services
            .session
            .tick_session(session_b, t0_b + time::Duration::seconds(180))
            .await;
        assert!(result_a.is_err());
        assert!(result_b.is_ok());
        assert_eq!(
            services
                .session
                .get_in_memory_session(session_b)
                .await
                .unwrap()
                .status,
            SessionStatus::RandomClosingWindow
        );
    }

    #[tokio::test]
    async fn test_tick_emits_countdown_update() {
        let sampler = MockWindowSampler::new();
        let mut audit_db = MockAuditDatabase::new();
        capture_events(&mut audit_db);
        let mut services = Service::new_with_mocks(
            permissive_session_db(),
            permissive_bid_db(),
            audit_db,
            sampler,
        );
        let session_id = create_running_session(&services, vec![test_item()]).await;
        let t0 = services
            .session
            .get_in_memory_session(session_id)
            .await
            .unwrap()
            .timing
            .last_bid_at
            .unwrap();
        services
            .session
            .tick_session(session_id, t0 + time::Duration::seconds(60))
            .await
            .unwrap();

        let mut saw_tick = false;
        while let Ok(update) = services.update_receiver.try_recv() {
            if let UpdateEvent::Tick(tick) = update {
                assert_eq!(tick.session_id, session_id);
                assert_eq!(tick.remaining_secs, Some(120));
                assert!(!tick.in_random_window);
                saw_tick = true;
            }
        }
        assert!(saw_tick);
    }
}
