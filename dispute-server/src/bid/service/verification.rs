use {
    super::Service,
    crate::{
        api::RestError,
        bid::entities::{
            BidCreate,
            BidRejectionReason,
        },
        session::entities::Session,
    },
};

impl Service {
    /// Preconditions for accepting a bid, each with its own rejection reason:
    /// the session must be open for bids (running or inside the random
    /// closing window), the item must be the one in dispute, and the amount
    /// must strictly undercut both the current best bid and the bidder's own
    /// last bid. Equality is rejected; this is a strict-decrease auction.
    ///
    /// Callers hold the session lock, so the ledger reads here and the
    /// subsequent append are one atomic unit.
    pub(super) async fn verify_bid(
        &self,
        session: &Session,
        create: &BidCreate,
    ) -> Result<(), RestError> {
        if !session.status.accepts_bids() {
            return Err(RestError::BidRejected(BidRejectionReason::SessionNotOpen));
        }
        if session.current_item_id != Some(create.item_id) {
            return Err(RestError::BidRejected(BidRejectionReason::WrongItem));
        }
        if let Some(best) = self
            .repo
            .get_in_memory_best_bid(create.session_id, create.item_id)
            .await
        {
            if create.amount >= best.amount {
                return Err(RestError::BidRejected(BidRejectionReason::NotImproving {
                    best: best.amount,
                }));
            }
        }
        if let Some(last) = self
            .repo
            .get_in_memory_last_bid_of(create.session_id, create.item_id, &create.bidder)
            .await
        {
            if create.amount >= last.amount {
                return Err(RestError::BidRejected(
                    BidRejectionReason::NotSelfImproving { last: last.amount },
                ));
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
            audit::repository::MockDatabase as MockAuditDatabase,
            bid::{
                entities::BidCreate,
                repository::MockDatabase as MockBidDatabase,
                service::{
                    CancelBidInput,
                    SubmitBidInput,
                },
            },
            kernel::entities::{
                ItemId,
                SessionId,
            },
            session::{
                entities::{
                    DisputeItem,
                    ItemDisputeStatus,
                    SessionStatus,
                },
                repository::MockDatabase as MockSessionDatabase,
                service::{
                    tests::TestServices,
                    BeginItemDisputeInput,
                    CloseItemDisputeInput,
                    CreateSessionInput,
                    MockWindowSampler,
                    Service as SessionService,
                    StartSessionInput,
                    SuspendSessionInput,
                },
            },
        },
        futures::future::join_all,
        rust_decimal::Decimal,
        rust_decimal_macros::dec,
        uuid::Uuid,
    };

    fn permissive_mocks() -> (MockSessionDatabase, MockBidDatabase, MockAuditDatabase) {
        let mut session_db = MockSessionDatabase::new();
        session_db.expect_add_session().returning(|_| Ok(()));
        session_db.expect_update_session().returning(|_| Ok(()));
        session_db.expect_add_chat_message().returning(|_| Ok(()));
        let mut bid_db = MockBidDatabase::new();
        bid_db.expect_add_bid().returning(|_| Ok(()));
        bid_db.expect_cancel_bid().returning(|_| Ok(()));
        let mut audit_db = MockAuditDatabase::new();
        audit_db.expect_add_event().returning(|_| Ok(()));
        (session_db, bid_db, audit_db)
    }

    async fn disputed_session() -> (TestServices, SessionId, ItemId) {
        let (session_db, bid_db, audit_db) = permissive_mocks();
        let services = SessionService::new_with_mocks(
            session_db,
            bid_db,
            audit_db,
            MockWindowSampler::new(),
        );
        let item = DisputeItem {
            id:              Uuid::new_v4(),
            number:          1,
            description:     "Desktop computer".to_string(),
            quantity:        dec!(50),
            unit:            "UN".to_string(),
            reference_price: dec!(4500.00),
            dispute_status:  ItemDisputeStatus::Awaiting,
        };
        let item_id = item.id;
        let session = services
            .session
            .create_session(CreateSessionInput {
                procurement_id:     Uuid::new_v4(),
                auctioneer_name:    "Maria Silva".to_string(),
                items:              vec![item],
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
                item_id,
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        (services, session.id, item_id)
    }

    fn bid(session_id: SessionId, item_id: ItemId, bidder: &str, amount: Decimal) -> SubmitBidInput {
        SubmitBidInput {
            bid_create: BidCreate {
                session_id,
                item_id,
                bidder: bidder.to_string(),
                amount,
                origin: Some("203.0.113.7".to_string()),
            },
        }
    }

    fn rejection(result: Result<crate::bid::entities::Bid, RestError>) -> BidRejectionReason {
        match result {
            Err(RestError::BidRejected(reason)) => reason,
            other => panic!("expected a bid rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_bid_strict_decrease_scenario() {
        let (services, session_id, item_id) = disputed_session().await;

        // A opens at 100.
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(100)))
            .await
            .unwrap();
        // B matching 100 is not an improvement; equality is rejected.
        assert_eq!(
            rejection(
                services
                    .bid
                    .submit_bid(bid(session_id, item_id, "supplier-b", dec!(100)))
                    .await
            ),
            BidRejectionReason::NotImproving { best: dec!(100) }
        );
        // B undercuts to 90.
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-b", dec!(90)))
            .await
            .unwrap();
        // A at 95 fails against the current best of 90.
        assert_eq!(
            rejection(
                services
                    .bid
                    .submit_bid(bid(session_id, item_id, "supplier-a", dec!(95)))
                    .await
            ),
            BidRejectionReason::NotImproving { best: dec!(90) }
        );
        // A at 85 is accepted.
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(85)))
            .await
            .unwrap();

        let bids = services.bid.get_session_bids(session_id).await.unwrap();
        let amounts: Vec<Decimal> = bids.iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![dec!(100), dec!(90), dec!(85)]);
    }

    #[tokio::test]
    async fn test_no_bidder_ever_holds_two_non_decreasing_bids() {
        let (services, session_id, item_id) = disputed_session().await;
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(100)))
            .await
            .unwrap();
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(90)))
            .await
            .unwrap();
        // Repeating one's own current amount is an equality, not a decrease.
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(90)))
            .await
            .map(|_| ())
            .unwrap_err();
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-b", dec!(85)))
            .await
            .unwrap();
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(80)))
            .await
            .unwrap();

        let committed = services.bid.get_session_bids(session_id).await.unwrap();
        for bidder in ["supplier-a", "supplier-b"] {
            let own: Vec<Decimal> = committed
                .iter()
                .filter(|b| !b.cancelled && b.bidder == bidder)
                .map(|b| b.amount)
                .collect();
            for window in own.windows(2) {
                assert!(window[1] < window[0]);
            }
        }
    }

    #[tokio::test]
    async fn test_submit_bid_wrong_item() {
        let (services, session_id, _) = disputed_session().await;
        assert_eq!(
            rejection(
                services
                    .bid
                    .submit_bid(bid(session_id, Uuid::new_v4(), "supplier-a", dec!(100)))
                    .await
            ),
            BidRejectionReason::WrongItem
        );
    }

    #[tokio::test]
    async fn test_submit_bid_session_not_open() {
        let (services, session_id, item_id) = disputed_session().await;
        services
            .session
            .suspend_session(SuspendSessionInput {
                session_id,
                reason: "incident".to_string(),
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            rejection(
                services
                    .bid
                    .submit_bid(bid(session_id, item_id, "supplier-a", dec!(100)))
                    .await
            ),
            BidRejectionReason::SessionNotOpen
        );
    }

    #[tokio::test]
    async fn test_submit_bid_unknown_session() {
        let (services, _, item_id) = disputed_session().await;
        let result = services
            .bid
            .submit_bid(bid(Uuid::new_v4(), item_id, "supplier-a", dec!(100)))
            .await;
        assert!(matches!(result, Err(RestError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_cancel_best_bid_promotes_second_best() {
        let (services, session_id, item_id) = disputed_session().await;
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(100)))
            .await
            .unwrap();
        let best = services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-b", dec!(90)))
            .await
            .unwrap();
        services
            .bid
            .cancel_bid(CancelBidInput {
                session_id,
                bid_id: best.id,
                justification: "duplicate submission".to_string(),
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();

        let ranked = services
            .bid
            .get_ranked_bids(session_id, item_id)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].amount, dec!(100));

        // The justification lands verbatim in the minutes.
        let minutes = services.audit.list_by_session(session_id).await.unwrap();
        let cancellation = minutes
            .iter()
            .find(|event| event.kind == crate::audit::entities::EventKind::BidCancelled)
            .expect("cancellation event missing");
        assert!(cancellation.description.contains("duplicate submission"));
    }

    #[tokio::test]
    async fn test_rejected_bids_leave_no_audit_trace() {
        let (services, session_id, item_id) = disputed_session().await;
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-a", dec!(100)))
            .await
            .unwrap();
        let before = services.audit.list_by_session(session_id).await.unwrap().len();
        services
            .bid
            .submit_bid(bid(session_id, item_id, "supplier-b", dec!(150)))
            .await
            .map(|_| ())
            .unwrap_err();
        let after = services.audit.list_by_session(session_id).await.unwrap().len();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_failed_durable_write_unwinds_bid() {
        let mut session_db = MockSessionDatabase::new();
        session_db.expect_add_session().returning(|_| Ok(()));
        session_db.expect_update_session().returning(|_| Ok(()));
        session_db.expect_add_chat_message().returning(|_| Ok(()));
        let mut bid_db = MockBidDatabase::new();
        bid_db
            .expect_add_bid()
            .returning(|_| Err(RestError::TemporarilyUnavailable));
        let mut audit_db = MockAuditDatabase::new();
        audit_db.expect_add_event().returning(|_| Ok(()));
        let services = SessionService::new_with_mocks(
            session_db,
            bid_db,
            audit_db,
            MockWindowSampler::new(),
        );
        let item = DisputeItem {
            id:              Uuid::new_v4(),
            number:          1,
            description:     "Desktop computer".to_string(),
            quantity:        dec!(50),
            unit:            "UN".to_string(),
            reference_price: dec!(4500.00),
            dispute_status:  ItemDisputeStatus::Awaiting,
        };
        let item_id = item.id;
        let session = services
            .session
            .create_session(CreateSessionInput {
                procurement_id:     Uuid::new_v4(),
                auctioneer_name:    "Maria Silva".to_string(),
                items:              vec![item],
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
                item_id,
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();

        let result = services
            .bid
            .submit_bid(bid(session.id, item_id, "supplier-a", dec!(100)))
            .await;
        assert!(matches!(result, Err(RestError::TemporarilyUnavailable)));
        // Not committed: the ledger shows nothing and the minutes carry no
        // bid-registered entry.
        assert!(services
            .bid
            .get_session_bids(session.id)
            .await
            .unwrap()
            .is_empty());
        assert!(!services
            .audit
            .list_by_session(session.id)
            .await
            .unwrap()
            .iter()
            .any(|event| {
                event.kind == crate::audit::entities::EventKind::BidRegistered
            }));
    }

    #[tokio::test]
    async fn test_manual_close_tears_down_session_and_keeps_durable_minutes() {
        let mut session_db = MockSessionDatabase::new();
        session_db.expect_add_session().returning(|_| Ok(()));
        session_db.expect_update_session().returning(|_| Ok(()));
        session_db.expect_add_chat_message().returning(|_| Ok(()));
        let mut bid_db = MockBidDatabase::new();
        bid_db.expect_add_bid().returning(|_| Ok(()));
        let mirrored = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut audit_db = MockAuditDatabase::new();
        let sink = mirrored.clone();
        audit_db.expect_add_event().returning(move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
        let fallback = mirrored.clone();
        audit_db
            .expect_get_events()
            .returning(move |_| Ok(fallback.lock().unwrap().clone()));
        let services = SessionService::new_with_mocks(
            session_db,
            bid_db,
            audit_db,
            MockWindowSampler::new(),
        );
        let item = DisputeItem {
            id:              Uuid::new_v4(),
            number:          1,
            description:     "Desktop computer".to_string(),
            quantity:        dec!(50),
            unit:            "UN".to_string(),
            reference_price: dec!(4500.00),
            dispute_status:  ItemDisputeStatus::Awaiting,
        };
        let item_id = item.id;
        let session = services
            .session
            .create_session(CreateSessionInput {
                procurement_id:     Uuid::new_v4(),
                auctioneer_name:    "Maria Silva".to_string(),
                items:              vec![item],
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
                item_id,
                actor: "Maria Silva".to_string(),
            })
            .await
            .unwrap();
        services
            .bid
            .submit_bid(bid(session.id, item_id, "supplier-a", dec!(100)))
            .await
            .unwrap();

        services
            .session
            .close_item_dispute(CloseItemDisputeInput {
                session_id: session.id,
                actor:      "Maria Silva".to_string(),
            })
            .await
            .unwrap();

        // Single item: the session closed and was torn down; the minutes are
        // served from durable storage and reference the winning bid.
        assert!(services
            .session
            .get_in_memory_session(session.id)
            .await
            .is_err());
        let minutes = services.audit.list_by_session(session.id).await.unwrap();
        let ended = minutes
            .iter()
            .find(|event| {
                event.kind == crate::audit::entities::EventKind::ItemDisputeEnded
            })
            .expect("dispute ended event missing");
        assert_eq!(ended.amount, Some(dec!(100)));
        assert!(ended.description.contains("by the auctioneer"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bids_keep_strict_decrease_invariant() {
        let (services, session_id, item_id) = disputed_session().await;

        let submissions = (0..8).map(|index| {
            let bid_service = services.bid.clone();
            let amount = Decimal::from(10 - index as i64);
            let bidder = format!("supplier-{index}");
            tokio::spawn(async move {
                bid_service
                    .submit_bid(SubmitBidInput {
                        bid_create: BidCreate {
                            session_id,
                            item_id,
                            bidder,
                            amount,
                            origin: None,
                        },
                    })
                    .await
            })
        });
        let outcomes: Vec<_> = join_all(submissions)
            .await
            .into_iter()
            .map(|joined| joined.expect("submission task panicked"))
            .collect();

        let accepted: Vec<Uuid> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok().map(|bid| bid.id))
            .collect();
        assert!(!accepted.is_empty());
        for outcome in &outcomes {
            if let Err(e) = outcome {
                assert!(matches!(e, RestError::BidRejected(_)));
            }
        }

        // In ledger commit order the accepted amounts strictly decrease, no
        // matter how the submissions interleaved.
        let committed = services.bid.get_session_bids(session_id).await.unwrap();
        assert_eq!(committed.len(), accepted.len());
        for window in committed.windows(2) {
            assert!(
                window[1].amount < window[0].amount,
                "ordering invariant violated: {} then {}",
                window[0].amount,
                window[1].amount
            );
        }
    }
}
