use {
    super::{
        Auth,
        RestError,
    },
    crate::{
        session::{
            entities,
            service::{
                BeginItemDisputeInput,
                CancelSessionInput,
                CloseItemDisputeInput,
                CreateSessionInput,
                StartSessionInput,
                SuspendSessionInput,
            },
        },
        state::StoreNew,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        Json,
    },
    dispute_api_types::session::{
        AdvancePhase,
        CancelSession,
        CreateSession,
        SessionEvent,
        SessionId,
        SessionSnapshot,
        StartItem,
        SuspendSession,
    },
    std::{
        sync::Arc,
        time::Duration,
    },
};

/// Register a procurement record as ready for dispute. The session starts in
/// the awaiting-start state; timing falls back to the configured defaults.
#[utoipa::path(post, path = "/v1/sessions", request_body = CreateSession,
responses(
    (status = 200, description = "The created session", body = SessionSnapshot),
    (status = 400, response = dispute_api_types::ErrorBodyResponse)
),)]
pub async fn post_session(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Json(body): Json<CreateSession>,
) -> Result<Json<SessionSnapshot>, RestError> {
    auth.require_operator(&store)?;
    let items = body
        .items
        .into_iter()
        .map(|item| entities::DisputeItem {
            id:              item.id,
            number:          item.number,
            description:     item.description,
            quantity:        item.quantity,
            unit:            item.unit,
            reference_price: item.reference_price,
            dispute_status:  entities::ItemDisputeStatus::Awaiting,
        })
        .collect();
    let session = store
        .session_service
        .create_session(CreateSessionInput {
            procurement_id:     body.procurement_id,
            auctioneer_name:    body.auctioneer_name,
            items,
            inactivity_timeout: body.inactivity_timeout_secs.map(Duration::from_secs),
            random_window_min:  body.random_window_min_secs.map(Duration::from_secs),
            random_window_max:  body.random_window_max_secs.map(Duration::from_secs),
        })
        .await?;
    Ok(Json(store.session_service.get_snapshot(session.id).await?))
}

/// The full externally visible state of a session.
#[utoipa::path(get, path = "/v1/sessions/{session_id}",
params(("session_id" = String, Path, description = "Session id")),
responses(
    (status = 200, description = "The session snapshot", body = SessionSnapshot),
    (status = 404, response = dispute_api_types::ErrorBodyResponse)
),)]
pub async fn get_session(
    State(store): State<Arc<StoreNew>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, RestError> {
    Ok(Json(store.session_service.get_snapshot(session_id).await?))
}

/// Open the public session.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/start",
params(("session_id" = String, Path, description = "Session id")),
responses((status = 200, description = "The session snapshot after the start", body = SessionSnapshot)),)]
pub async fn start_session(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .start_session(StartSessionInput {
            session_id,
            actor: session.auctioneer_name,
        })
        .await?;
    Ok(Json(store.session_service.get_snapshot(session_id).await?))
}

/// Put an item into dispute.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/items/start",
params(("session_id" = String, Path, description = "Session id")),
request_body = StartItem,
responses((status = 200, description = "The session snapshot after the item opened", body = SessionSnapshot)),)]
pub async fn start_item(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
    Json(body): Json<StartItem>,
) -> Result<Json<SessionSnapshot>, RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .begin_item_dispute(BeginItemDisputeInput {
            session_id,
            item_id: body.item_id,
            actor: session.auctioneer_name,
        })
        .await?;
    Ok(Json(store.session_service.get_snapshot(session_id).await?))
}

/// Manually end the dispute of the current item, overriding the timer.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/items/close",
params(("session_id" = String, Path, description = "Session id")),
responses((status = 200, description = "Dispute ended")),)]
pub async fn close_item(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
) -> Result<(), RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .close_item_dispute(CloseItemDisputeInput {
            session_id,
            actor: session.auctioneer_name,
        })
        .await
}

/// Suspend the session; an active random closing window is discarded.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/suspend",
params(("session_id" = String, Path, description = "Session id")),
request_body = SuspendSession,
responses((status = 200, description = "The session snapshot after suspension", body = SessionSnapshot)),)]
pub async fn suspend_session(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
    Json(body): Json<SuspendSession>,
) -> Result<Json<SessionSnapshot>, RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .suspend_session(SuspendSessionInput {
            session_id,
            reason: body.reason,
            actor: session.auctioneer_name,
        })
        .await?;
    Ok(Json(store.session_service.get_snapshot(session_id).await?))
}

/// Resume a suspended session. The inactivity clock restarts from zero.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/resume",
params(("session_id" = String, Path, description = "Session id")),
responses((status = 200, description = "The session snapshot after resumption", body = SessionSnapshot)),)]
pub async fn resume_session(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .resume_session(session_id, session.auctioneer_name)
        .await?;
    Ok(Json(store.session_service.get_snapshot(session_id).await?))
}

/// Cancel the session from any non-terminal state.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/cancel",
params(("session_id" = String, Path, description = "Session id")),
request_body = CancelSession,
responses((status = 200, description = "Session cancelled")),)]
pub async fn cancel_session(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
    Json(body): Json<CancelSession>,
) -> Result<(), RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .cancel_session(CancelSessionInput {
            session_id,
            reason: body.reason,
            actor: session.auctioneer_name,
        })
        .await
}

/// Record a legal-phase transition driven by the surrounding system.
#[utoipa::path(post, path = "/v1/sessions/{session_id}/phase",
params(("session_id" = String, Path, description = "Session id")),
request_body = AdvancePhase,
responses((status = 200, description = "The session snapshot after the transition", body = SessionSnapshot)),)]
pub async fn advance_phase(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Path(session_id): Path<SessionId>,
    Json(body): Json<AdvancePhase>,
) -> Result<Json<SessionSnapshot>, RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    store
        .session_service
        .advance_phase(session_id, body.phase.into(), session.auctioneer_name)
        .await?;
    Ok(Json(store.session_service.get_snapshot(session_id).await?))
}

/// The electronic minutes of the session, ordered by occurrence.
#[utoipa::path(get, path = "/v1/sessions/{session_id}/minutes",
params(("session_id" = String, Path, description = "Session id")),
responses((status = 200, description = "The session events in minutes order", body = Vec<SessionEvent>)),)]
pub async fn get_minutes(
    State(store): State<Arc<StoreNew>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Vec<SessionEvent>>, RestError> {
    let events = store.audit_service.list_by_session(session_id).await?;
    Ok(Json(events.iter().map(SessionEvent::from).collect()))
}
