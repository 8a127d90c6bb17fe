use {
    crate::{
        bid::entities::BidRejectionReason,
        config::RunOptions,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        session::entities::SessionError,
        state::StoreNew,
    },
    anyhow::Result,
    axum::{
        async_trait,
        extract::FromRequestParts,
        http::{
            request::Parts,
            StatusCode,
        },
        response::{
            IntoResponse,
            Response,
        },
        routing::{
            get,
            post,
        },
        Json,
        Router,
    },
    axum_extra::{
        headers::{
            authorization::Bearer,
            Authorization,
        },
        TypedHeader,
    },
    axum_prometheus::PrometheusMetricLayer,
    clap::crate_version,
    dispute_api_types::{
        bid::{
            BidCancel,
            BidCreate,
            BidResult,
        },
        session::{
            AdjudicationCandidate,
            AdvancePhase,
            CancelSession,
            ChatMessage,
            CreateSession,
            CreateSessionItem,
            ItemSnapshot,
            ParticipantInfo,
            RankedBid,
            SessionEvent,
            SessionSnapshot,
            StartItem,
            SuspendSession,
            TickUpdate,
        },
        ws::{
            APIResponse,
            ClientMessage,
            ClientRequest,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
        ErrorBodyResponse,
    },
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

pub(crate) mod bid;
pub(crate) mod session;
pub(crate) mod ws;

async fn root() -> String {
    format!("Dispute Session Server API {}", crate_version!())
}

#[derive(Debug)]
pub enum RestError {
    /// The request contained invalid parameters.
    BadParameters(String),
    /// The operation is not legal in the session's current state. The
    /// session is left untouched.
    InvalidTransition(String),
    /// The bid failed arbitration. Reported to the submitting participant
    /// only; the session and ledger are untouched.
    BidRejected(BidRejectionReason),
    /// The session was not found.
    SessionNotFound,
    /// The item was not found in the session.
    ItemNotFound,
    /// The bid was not found.
    BidNotFound,
    /// The caller lacks the operator credential.
    Unauthorized,
    /// The client has too many open websocket connections.
    TooManyOpenWebsocketConnections,
    /// Durable storage refused the write; the in-memory decision is not
    /// committed and the caller should retry.
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.clone()),
            RestError::BidRejected(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
            RestError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "Session with the specified id was not found".to_string(),
            ),
            RestError::ItemNotFound => (
                StatusCode::NOT_FOUND,
                "Item with the specified id was not found in this session".to_string(),
            ),
            RestError::BidNotFound => (
                StatusCode::NOT_FOUND,
                "Bid with the specified id was not found".to_string(),
            ),
            RestError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "This operation requires the operator credential".to_string(),
            ),
            RestError::TooManyOpenWebsocketConnections => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many open websocket connections".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

impl std::fmt::Display for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (_, msg) = self.to_status_and_message();
        write!(f, "{}", msg)
    }
}

impl From<SessionError> for RestError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::UnknownItem(_) => RestError::ItemNotFound,
            other => RestError::InvalidTransition(other.to_string()),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Bearer credential of the auctioneer-role operator, when present. Identity
/// and role management live in the surrounding system; the engine only
/// compares against its configured token.
#[derive(Clone)]
pub struct Auth {
    token: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(bearer)) => Ok(Self {
                token: Some(bearer.token().to_string()),
            }),
            Err(_) => Ok(Self { token: None }),
        }
    }
}

impl Auth {
    pub fn require_operator(&self, store: &StoreNew) -> Result<(), RestError> {
        match &self.token {
            Some(token) if *token == store.store.operator_token => Ok(()),
            _ => Err(RestError::Unauthorized),
        }
    }
}

pub async fn start_api(
    run_options: RunOptions,
    store: Arc<StoreNew>,
    metric_layer: PrometheusMetricLayer<'static>,
) -> Result<()> {
    // Make sure functions included in the paths section have distinct names,
    // otherwise some api generators will fail.
    #[derive(OpenApi)]
    #[openapi(
    paths(
    session::post_session,
    session::get_session,
    session::start_session,
    session::start_item,
    session::close_item,
    session::suspend_session,
    session::resume_session,
    session::cancel_session,
    session::advance_phase,
    session::get_minutes,
    bid::post_bid,
    bid::cancel_bid,
    bid::get_bids,
    ),
    components(
    schemas(
    AdjudicationCandidate,
    AdvancePhase,
    APIResponse,
    BidCancel,
    BidCreate,
    BidResult,
    CancelSession,
    ChatMessage,
    ClientMessage,
    ClientRequest,
    CreateSession,
    CreateSessionItem,
    ErrorBodyResponse,
    ItemSnapshot,
    ParticipantInfo,
    RankedBid,
    ServerResultMessage,
    ServerResultResponse,
    ServerUpdateResponse,
    SessionEvent,
    SessionSnapshot,
    StartItem,
    SuspendSession,
    TickUpdate,
    ),
    responses(
    ErrorBodyResponse,
    BidResult,
    ),
    ),
    tags(
    (name = "Dispute Session Server", description = "The dispute session server runs the live \
    reverse-auction phase of public tenders: it arbitrates bids, drives the anti-sniping random \
    closing window and keeps the electronic minutes of every session.")
    )
    )]
    struct ApiDoc;

    let session_routes = Router::new()
        .route("/", post(session::post_session))
        .route("/:session_id", get(session::get_session))
        .route("/:session_id/start", post(session::start_session))
        .route("/:session_id/items/start", post(session::start_item))
        .route("/:session_id/items/close", post(session::close_item))
        .route("/:session_id/suspend", post(session::suspend_session))
        .route("/:session_id/resume", post(session::resume_session))
        .route("/:session_id/cancel", post(session::cancel_session))
        .route("/:session_id/phase", post(session::advance_phase))
        .route("/:session_id/minutes", get(session::get_minutes))
        .route("/:session_id/bids", get(bid::get_bids));
    let bid_routes = Router::new()
        .route("/", post(bid::post_bid))
        .route("/cancel", post(bid::cancel_bid));

    let v1_routes = Router::new().nest(
        "/v1",
        Router::new()
            .nest("/sessions", session_routes)
            .nest("/bids", bid_routes)
            .route("/ws", get(ws::ws_route_handler)),
    );

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url("/docs", ApiDoc::openapi()))
        .merge(v1_routes)
        .route("/", get(root))
        .route("/live", get(live))
        .layer(CorsLayer::permissive())
        .layer(metric_layer)
        .with_state(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    tracing::info!("API server listening on {}", run_options.server.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down API server...");
        })
        .await?;
    Ok(())
}
