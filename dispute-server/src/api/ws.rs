use {
    super::bid::requester_ip,
    crate::{
        bid::{
            entities as bid_entities,
            service::{
                CancelBidInput,
                SubmitBidInput,
            },
        },
        kernel::entities::SessionId,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        session::{
            entities::ChatSenderRole,
            service::{
                BeginItemDisputeInput,
                CloseItemDisputeInput,
                SendChatMessageInput,
                SuspendSessionInput,
            },
        },
        state::StoreNew,
    },
    anyhow::{
        anyhow,
        Result,
    },
    axum::{
        extract::{
            ws::{
                Message,
                WebSocket,
            },
            State,
            WebSocketUpgrade,
        },
        http::HeaderMap,
        response::IntoResponse,
    },
    dispute_api_types::{
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
            SessionSnapshot,
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
    },
    futures::{
        stream::{
            SplitSink,
            SplitStream,
        },
        SinkExt,
        StreamExt,
    },
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        future::Future,
        net::IpAddr,
        sync::{
            atomic::{
                AtomicUsize,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio::sync::{
        broadcast,
        RwLock,
        Semaphore,
    },
    tracing::{
        instrument,
        Instrument,
    },
};

/// Presence entry of one connected participant. A presence cache, not source
/// of truth: it is rebuilt from reconnections and lost on restart.
#[derive(Clone, Debug)]
pub struct Participant {
    pub participant_id: String,
    pub display_name:   String,
    pub role:           ParticipantRole,
}

pub struct WsState {
    pub requester_ip_header_name: String,
    subscriber_counter:           AtomicUsize,
    subscriber_per_ip:            RwLock<HashMap<IpAddr, HashSet<SubscriberId>>>,
    participants:                 RwLock<HashMap<SessionId, HashMap<SubscriberId, Participant>>>,
    pub broadcast_sender:         broadcast::Sender<UpdateEvent>,
    pub broadcast_receiver:       broadcast::Receiver<UpdateEvent>,
}

const MAXIMUM_SUBSCRIBERS_PER_IP: usize = 10;

impl WsState {
    pub fn new(requester_ip_header_name: String, broadcast_channel_size: usize) -> Self {
        let (broadcast_sender, broadcast_receiver) = broadcast::channel(broadcast_channel_size);
        Self {
            requester_ip_header_name,
            subscriber_counter: AtomicUsize::new(0),
            subscriber_per_ip: RwLock::new(HashMap::new()),
            participants: RwLock::new(HashMap::new()),
            broadcast_sender,
            broadcast_receiver,
        }
    }

    /// If the specified IP address has too many open websocket connections,
    /// this function will return none. Otherwise, it will return the new
    /// subscriber id.
    pub async fn get_new_subscriber_id(&self, ip: Option<IpAddr>) -> Option<SubscriberId> {
        let id = self.subscriber_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            let ids = write_guard.entry(ip).or_insert_with(HashSet::new);
            if ids.len() >= MAXIMUM_SUBSCRIBERS_PER_IP {
                return None;
            }
            ids.insert(id);
        }
        Some(id)
    }

    pub async fn remove_subscriber(&self, id: SubscriberId, ip: Option<IpAddr>) {
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            if let Some(ids) = write_guard.get_mut(&ip) {
                ids.remove(&id);
                if ids.is_empty() {
                    write_guard.remove(&ip);
                }
            }
        }
    }

    /// Registers presence. A participant holds one active connection: a
    /// rejoin under a new connection supersedes the old one for presence
    /// purposes without touching bid history.
    pub async fn join_session(
        &self,
        session_id: SessionId,
        subscriber_id: SubscriberId,
        participant: Participant,
    ) {
        let mut participants = self.participants.write().await;
        let session_participants = participants.entry(session_id).or_insert_with(HashMap::new);
        session_participants
            .retain(|_, existing| existing.participant_id != participant.participant_id);
        session_participants.insert(subscriber_id, participant);
    }

    pub async fn leave_session(&self, session_id: SessionId, subscriber_id: SubscriberId) {
        let mut participants = self.participants.write().await;
        if let Some(session_participants) = participants.get_mut(&session_id) {
            session_participants.remove(&subscriber_id);
            if session_participants.is_empty() {
                participants.remove(&session_id);
            }
        }
    }

    /// Clears the presence of a dropped connection and returns the sessions
    /// whose participant list changed.
    pub async fn leave_all(&self, subscriber_id: SubscriberId) -> Vec<SessionId> {
        let mut affected = Vec::new();
        let mut participants = self.participants.write().await;
        participants.retain(|session_id, session_participants| {
            if session_participants.remove(&subscriber_id).is_some() {
                affected.push(*session_id);
            }
            !session_participants.is_empty()
        });
        affected
    }

    pub async fn get_participants(&self, session_id: SessionId) -> Vec<Participant> {
        self.participants
            .read()
            .await
            .get(&session_id)
            .map(|session_participants| session_participants.values().cloned().collect())
            .unwrap_or_default()
    }
}

pub async fn ws_route_handler(
    ws: WebSocketUpgrade,
    State(store): State<Arc<StoreNew>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ws_state = &store.store.ws;
    let ip: Option<IpAddr> = requester_ip(&store, &headers).and_then(|value| value.parse().ok());
    if ip.is_none() {
        tracing::warn!("Failed to get requester IP address");
    }

    match ws_state.get_new_subscriber_id(ip).await {
        Some(subscriber_id) => {
            ws.on_upgrade(move |socket| websocket_handler(socket, store, subscriber_id, ip))
        }
        None => super::RestError::TooManyOpenWebsocketConnections.into_response(),
    }
}

async fn websocket_handler(
    stream: WebSocket,
    state: Arc<StoreNew>,
    subscriber_id: SubscriberId,
    requester_ip: Option<IpAddr>,
) {
    let (sender, receiver) = stream.split();
    let new_receiver = state.store.ws.broadcast_receiver.resubscribe();
    let mut subscriber = Subscriber::new(
        subscriber_id,
        state.clone(),
        new_receiver,
        receiver,
        sender,
        requester_ip,
    );
    subscriber.run().await;
    let ws_state = &state.store.ws;
    ws_state.remove_subscriber(subscriber_id, requester_ip).await;
    // A disconnect cancels presence only, never an in-flight bid decision.
    for session_id in ws_state.leave_all(subscriber_id).await {
        state.session_service.broadcast_state(session_id).await;
    }
}

#[derive(Clone, Debug)]
pub enum UpdateEvent {
    StateSnapshot(SessionSnapshot),
    Tick(TickUpdate),
    NewEvent(SessionEvent),
    NewChatMessage(ChatMessage),
    AdjudicationCandidate(AdjudicationCandidate),
}

pub type SubscriberId = usize;

#[derive(Debug, Clone)]
struct DeferredResponse {
    response: ServerResultResponse,
}

#[derive(Clone, Debug)]
struct JoinedAs {
    display_name: String,
    role:         ParticipantRole,
}

/// Subscriber is an actor that handles a single websocket connection. It
/// listens to the store for updates of the sessions it joined and sends them
/// to the client.
pub struct Subscriber {
    id:                  SubscriberId,
    closed:              bool,
    store:               Arc<StoreNew>,
    notify_receiver:     broadcast::Receiver<UpdateEvent>,
    receiver:            SplitStream<WebSocket>,
    sender:              SplitSink<WebSocket, Message>,
    joined_sessions:     HashMap<SessionId, JoinedAs>,
    requester_ip:        Option<IpAddr>,
    ping_interval:       tokio::time::Interval,
    exit_check_interval: tokio::time::Interval,
    responded_to_ping:   bool,
    active_requests:     Arc<Semaphore>,
    response_sender:     broadcast::Sender<DeferredResponse>,
    response_receiver:   broadcast::Receiver<DeferredResponse>,
}

const PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);
const MAX_ACTIVE_REQUESTS: usize = 50;

fn ok_response(id: String) -> ServerResultResponse {
    ServerResultResponse {
        id:     Some(id),
        result: ServerResultMessage::Success(None),
    }
}

fn err_response(id: String, message: String) -> ServerResultResponse {
    ServerResultResponse {
        id:     Some(id),
        result: ServerResultMessage::Err(message),
    }
}

impl Subscriber {
    pub fn new(
        id: SubscriberId,
        store: Arc<StoreNew>,
        notify_receiver: broadcast::Receiver<UpdateEvent>,
        receiver: SplitStream<WebSocket>,
        sender: SplitSink<WebSocket, Message>,
        requester_ip: Option<IpAddr>,
    ) -> Self {
        let (response_sender, response_receiver) = broadcast::channel(100);
        Self {
            id,
            closed: false,
            store,
            notify_receiver,
            receiver,
            sender,
            joined_sessions: HashMap::new(),
            requester_ip,
            ping_interval: tokio::time::interval(PING_INTERVAL_DURATION),
            exit_check_interval: tokio::time::interval(EXIT_CHECK_INTERVAL),
            // We start with true so we don't close the connection immediately.
            responded_to_ping: true,
            active_requests: Arc::new(Semaphore::new(MAX_ACTIVE_REQUESTS)),
            response_sender,
            response_receiver,
        }
    }

    pub async fn run(&mut self) {
        while !self.closed {
            if let Err(e) = self.handle_next().await {
                tracing::debug!(subscriber = self.id, error = ?e, "Error Handling Subscriber Message.");
                break;
            }
        }
    }

    async fn handle_next(&mut self) -> Result<()> {
        tokio::select! {
            maybe_update_event = self.notify_receiver.recv() => {
                match maybe_update_event {
                    Ok(event) => self.handle_update(event).await,
                    Err(e) => Err(anyhow!("Error receiving update event: {:?}", e)),
                }
            },
            maybe_message_or_err = self.receiver.next() => {
                self.handle_client_message(
                    maybe_message_or_err.ok_or(anyhow!("Client channel is closed"))??
                ).await
            },
            response_received = self.response_receiver.recv() => {
                match response_received {
                    Ok(DeferredResponse { response }) => {
                        self.sender.send(serde_json::to_string(&response)?.into()).await?;
                    }
                    Err(e) => {
                        tracing::warn!(
                            subscriber = self.id,
                            error = ?e,
                            "Error Handling Subscriber Response Message."
                        );
                    }
                }
                Ok(())
            },
            _  = self.ping_interval.tick() => {
                if !self.responded_to_ping {
                    return Err(anyhow!("Subscriber did not respond to ping. Closing connection."));
                }
                self.responded_to_ping = false;
                self.sender.send(Message::Ping(vec![])).await?;
                Ok(())
            },
            _ = self.exit_check_interval.tick() => {
                if SHOULD_EXIT.load(Ordering::Acquire) {
                    self.sender.close().await?;
                    self.closed = true;
                    return Err(anyhow!("Application is shutting down. Closing connection."));
                }
                Ok(())
            }
        }
    }

    fn is_joined(&self, session_id: &SessionId) -> bool {
        self.joined_sessions.contains_key(session_id)
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_update", result = "success", name),
        skip_all
    )]
    async fn handle_update(&mut self, event: UpdateEvent) -> Result<()> {
        let response = match event {
            UpdateEvent::StateSnapshot(snapshot) => {
                tracing::Span::current().record("name", "state_snapshot");
                if !self.is_joined(&snapshot.session_id) {
                    return Ok(());
                }
                ServerUpdateResponse::StateSnapshot { snapshot }
            }
            UpdateEvent::Tick(update) => {
                tracing::Span::current().record("name", "tick");
                if !self.is_joined(&update.session_id) {
                    return Ok(());
                }
                ServerUpdateResponse::Tick { update }
            }
            UpdateEvent::NewEvent(event) => {
                tracing::Span::current().record("name", "event");
                if !self.is_joined(&event.session_id) {
                    return Ok(());
                }
                ServerUpdateResponse::Event { event }
            }
            UpdateEvent::NewChatMessage(message) => {
                tracing::Span::current().record("name", "chat_message");
                if !self.is_joined(&message.session_id) {
                    return Ok(());
                }
                ServerUpdateResponse::ChatMessage { message }
            }
            UpdateEvent::AdjudicationCandidate(candidate) => {
                tracing::Span::current().record("name", "adjudication_candidate");
                if !self.is_joined(&candidate.session_id) {
                    return Ok(());
                }
                ServerUpdateResponse::AdjudicationCandidate { candidate }
            }
        };
        let message = serde_json::to_string(&response)?;
        if let Err(e) = self.sender.send(message.into()).await {
            tracing::Span::current().record("result", "error");
            return Err(e.into());
        }
        Ok(())
    }

    fn send_response(
        response_sender: &broadcast::Sender<DeferredResponse>,
        deferred_response: DeferredResponse,
    ) {
        if matches!(
            deferred_response.response.result,
            ServerResultMessage::Err(_)
        ) {
            tracing::Span::current().record("result", "error");
        }
        if let Err(e) = response_sender.send(deferred_response) {
            tracing::warn!(error = ?e, "Error sending response to subscriber");
        }
    }

    async fn spawn_deferred(
        &mut self,
        fut: impl Future<Output = ServerResultResponse> + Send + 'static,
    ) {
        let permit = self
            .active_requests
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");
        let response_sender = self.response_sender.clone();
        self.store.task_tracker.spawn(
            async move {
                let response = fut.await;
                Self::send_response(&response_sender, DeferredResponse { response });
                drop(permit);
            }
            .in_current_span(),
        );
    }

    async fn handle_join(
        &mut self,
        message_id: String,
        session_id: SessionId,
        participant_id: String,
        display_name: String,
        role: ParticipantRole,
    ) {
        let response = match self.store.session_service.get_snapshot(session_id).await {
            Ok(_) => {
                self.store
                    .store
                    .ws
                    .join_session(
                        session_id,
                        self.id,
                        Participant {
                            participant_id,
                            display_name: display_name.clone(),
                            role,
                        },
                    )
                    .await;
                self.joined_sessions
                    .insert(session_id, JoinedAs { display_name, role });
                // The joining client gets the snapshot in its response; the
                // other participants see the updated presence list.
                self.store.session_service.broadcast_state(session_id).await;
                match self.store.session_service.get_snapshot(session_id).await {
                    Ok(snapshot) => ServerResultResponse {
                        id:     Some(message_id),
                        result: ServerResultMessage::Success(Some(APIResponse::Snapshot(
                            snapshot,
                        ))),
                    },
                    Err(e) => err_response(message_id, e.to_status_and_message().1),
                }
            }
            Err(e) => err_response(message_id, e.to_status_and_message().1),
        };
        Self::send_response(&self.response_sender, DeferredResponse { response });
    }

    async fn handle_leave(&mut self, message_id: String, session_id: SessionId) {
        self.store.store.ws.leave_session(session_id, self.id).await;
        self.joined_sessions.remove(&session_id);
        self.store.session_service.broadcast_state(session_id).await;
        Self::send_response(
            &self.response_sender,
            DeferredResponse {
                response: ok_response(message_id),
            },
        );
    }

    async fn handle_submit_bid(&mut self, message_id: String, bid: BidCreate) {
        let store = self.store.clone();
        let origin = self.requester_ip.map(|ip| ip.to_string());
        self.spawn_deferred(async move {
            match store
                .bid_service
                .submit_bid(SubmitBidInput {
                    bid_create: bid_entities::BidCreate {
                        session_id: bid.session_id,
                        item_id:    bid.item_id,
                        bidder:     bid.bidder,
                        amount:     bid.amount,
                        origin,
                    },
                })
                .await
            {
                Ok(accepted) => ServerResultResponse {
                    id:     Some(message_id),
                    result: ServerResultMessage::Success(Some(APIResponse::BidResult(
                        BidResult {
                            status: "OK".to_string(),
                            id:     accepted.id,
                        },
                    ))),
                },
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    /// Auctioneer-only operations are gated on the role this connection
    /// joined the session with.
    fn auctioneer_name(&self, session_id: &SessionId) -> Option<String> {
        self.joined_sessions.get(session_id).and_then(|joined| {
            (joined.role == ParticipantRole::Auctioneer).then(|| joined.display_name.clone())
        })
    }

    async fn handle_cancel_bid(&mut self, message_id: String, data: BidCancel) {
        let Some(actor) = self.auctioneer_name(&data.session_id) else {
            let response = err_response(
                message_id,
                "Only the auctioneer may cancel bids".to_string(),
            );
            Self::send_response(&self.response_sender, DeferredResponse { response });
            return;
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .bid_service
                .cancel_bid(CancelBidInput {
                    session_id: data.session_id,
                    bid_id: data.bid_id,
                    justification: data.justification,
                    actor,
                })
                .await
            {
                Ok(()) => ok_response(message_id),
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    async fn handle_start_item(
        &mut self,
        message_id: String,
        session_id: SessionId,
        item_id: ItemId,
    ) {
        let Some(actor) = self.auctioneer_name(&session_id) else {
            let response = err_response(
                message_id,
                "Only the auctioneer may start an item dispute".to_string(),
            );
            Self::send_response(&self.response_sender, DeferredResponse { response });
            return;
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .session_service
                .begin_item_dispute(BeginItemDisputeInput {
                    session_id,
                    item_id,
                    actor,
                })
                .await
            {
                Ok(()) => ok_response(message_id),
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    async fn handle_close_item(&mut self, message_id: String, session_id: SessionId) {
        let Some(actor) = self.auctioneer_name(&session_id) else {
            let response = err_response(
                message_id,
                "Only the auctioneer may close an item dispute".to_string(),
            );
            Self::send_response(&self.response_sender, DeferredResponse { response });
            return;
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .session_service
                .close_item_dispute(CloseItemDisputeInput { session_id, actor })
                .await
            {
                Ok(()) => ok_response(message_id),
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    async fn handle_suspend(&mut self, message_id: String, session_id: SessionId, reason: String) {
        let Some(actor) = self.auctioneer_name(&session_id) else {
            let response = err_response(
                message_id,
                "Only the auctioneer may suspend the session".to_string(),
            );
            Self::send_response(&self.response_sender, DeferredResponse { response });
            return;
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .session_service
                .suspend_session(SuspendSessionInput {
                    session_id,
                    reason,
                    actor,
                })
                .await
            {
                Ok(()) => ok_response(message_id),
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    async fn handle_resume(&mut self, message_id: String, session_id: SessionId) {
        let Some(actor) = self.auctioneer_name(&session_id) else {
            let response = err_response(
                message_id,
                "Only the auctioneer may resume the session".to_string(),
            );
            Self::send_response(&self.response_sender, DeferredResponse { response });
            return;
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store.session_service.resume_session(session_id, actor).await {
                Ok(()) => ok_response(message_id),
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    async fn handle_chat(&mut self, message_id: String, session_id: SessionId, body: String) {
        let Some(joined) = self.joined_sessions.get(&session_id) else {
            let response = err_response(
                message_id,
                "Join the session before sending chat messages".to_string(),
            );
            Self::send_response(&self.response_sender, DeferredResponse { response });
            return;
        };
        let sender_role = match joined.role {
            ParticipantRole::Auctioneer => ChatSenderRole::Auctioneer,
            ParticipantRole::Bidder => ChatSenderRole::Bidder,
        };
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match store
                .session_service
                .send_chat_message(SendChatMessageInput {
                    session_id,
                    sender_role,
                    body,
                })
                .await
            {
                Ok(_) => ok_response(message_id),
                Err(e) => err_response(message_id, e.to_status_and_message().1),
            }
        })
        .await;
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_client_message", result = "success", name),
        skip_all
    )]
    async fn handle_client_message(&mut self, message: Message) -> Result<()> {
        let maybe_client_message = match message {
            Message::Close(_) => {
                // Closing the connection. Send the close message to
                // gracefully shut down the connection, otherwise the client
                // might get an abnormal websocket closure error.
                tracing::Span::current().record("name", "close");
                if let Err(e) = self.sender.close().await {
                    tracing::Span::current().record("result", "error");
                    return Err(e.into());
                }
                self.closed = true;
                return Ok(());
            }
            Message::Text(text) => serde_json::from_str::<ClientRequest>(&text),
            Message::Binary(data) => serde_json::from_slice::<ClientRequest>(&data),
            Message::Ping(_) => {
                // Axum will send Pong automatically.
                tracing::Span::current().record("name", "ping");
                return Ok(());
            }
            Message::Pong(_) => {
                tracing::Span::current().record("name", "pong");
                self.responded_to_ping = true;
                return Ok(());
            }
        };

        match maybe_client_message {
            Err(e) => {
                Self::send_response(
                    &self.response_sender,
                    DeferredResponse {
                        response: ServerResultResponse {
                            id:     None,
                            result: ServerResultMessage::Err(e.to_string()),
                        },
                    },
                );
            }
            Ok(ClientRequest { msg, id }) => match msg {
                ClientMessage::Join {
                    session_id,
                    participant_id,
                    display_name,
                    role,
                } => {
                    tracing::Span::current().record("name", "join");
                    self.handle_join(id, session_id, participant_id, display_name, role)
                        .await
                }
                ClientMessage::Leave { session_id } => {
                    tracing::Span::current().record("name", "leave");
                    self.handle_leave(id, session_id).await
                }
                ClientMessage::SubmitBid { bid } => {
                    tracing::Span::current().record("name", "submit_bid");
                    self.handle_submit_bid(id, bid).await
                }
                ClientMessage::CancelBid { data } => {
                    tracing::Span::current().record("name", "cancel_bid");
                    self.handle_cancel_bid(id, data).await
                }
                ClientMessage::StartItem {
                    session_id,
                    item_id,
                } => {
                    tracing::Span::current().record("name", "start_item");
                    self.handle_start_item(id, session_id, item_id).await
                }
                ClientMessage::CloseItem { session_id } => {
                    tracing::Span::current().record("name", "close_item");
                    self.handle_close_item(id, session_id).await
                }
                ClientMessage::Suspend { session_id, reason } => {
                    tracing::Span::current().record("name", "suspend");
                    self.handle_suspend(id, session_id, reason).await
                }
                ClientMessage::Resume { session_id } => {
                    tracing::Span::current().record("name", "resume");
                    self.handle_resume(id, session_id).await
                }
                ClientMessage::Chat { session_id, body } => {
                    tracing::Span::current().record("name", "chat");
                    self.handle_chat(id, session_id, body).await
                }
            },
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        uuid::Uuid,
    };

    fn bidder(participant_id: &str) -> Participant {
        Participant {
            participant_id: participant_id.to_string(),
            display_name:   format!("{participant_id} Ltda"),
            role:           ParticipantRole::Bidder,
        }
    }

    #[tokio::test]
    async fn test_rejoin_supersedes_previous_connection() {
        let ws_state = WsState::new("X-Forwarded-For".to_string(), 16);
        let session_id = Uuid::new_v4();
        ws_state.join_session(session_id, 1, bidder("supplier-a")).await;
        ws_state.join_session(session_id, 2, bidder("supplier-b")).await;
        // supplier-a reconnects under a new connection id.
        ws_state.join_session(session_id, 3, bidder("supplier-a")).await;

        let participants = ws_state.get_participants(session_id).await;
        assert_eq!(participants.len(), 2);
        let handles: Vec<&str> = participants
            .iter()
            .map(|p| p.participant_id.as_str())
            .collect();
        assert!(handles.contains(&"supplier-a"));
        assert!(handles.contains(&"supplier-b"));
    }

    #[tokio::test]
    async fn test_disconnect_clears_presence_only_for_that_connection() {
        let ws_state = WsState::new("X-Forwarded-For".to_string(), 16);
        let session_a = Uuid::new_v4();
        let session_b = Uuid::new_v4();
        ws_state.join_session(session_a, 1, bidder("supplier-a")).await;
        ws_state.join_session(session_b, 1, bidder("supplier-a")).await;
        ws_state.join_session(session_a, 2, bidder("supplier-b")).await;

        let mut affected = ws_state.leave_all(1).await;
        affected.sort();
        let mut expected = vec![session_a, session_b];
        expected.sort();
        assert_eq!(affected, expected);
        assert_eq!(ws_state.get_participants(session_a).await.len(), 1);
        assert!(ws_state.get_participants(session_b).await.is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_cap_per_ip() {
        let ws_state = WsState::new("X-Forwarded-For".to_string(), 16);
        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        for _ in 0..MAXIMUM_SUBSCRIBERS_PER_IP {
            assert!(ws_state.get_new_subscriber_id(Some(ip)).await.is_some());
        }
        assert!(ws_state.get_new_subscriber_id(Some(ip)).await.is_none());
    }
}
