use {
    super::{
        Auth,
        RestError,
    },
    crate::{
        bid::{
            entities,
            service::{
                CancelBidInput,
                SubmitBidInput,
            },
        },
        kernel::entities::mask_handle,
        state::StoreNew,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        http::HeaderMap,
        Json,
    },
    dispute_api_types::{
        bid::{
            BidCancel,
            BidCreate,
            BidResult,
        },
        session::{
            RankedBid,
            SessionId,
        },
    },
    std::sync::Arc,
};

pub fn requester_ip(store: &StoreNew, headers: &HeaderMap) -> Option<String> {
    headers
        .get(store.store.ws.requester_ip_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        // Only take the first ip if there are multiple.
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
}

/// Submit a bid for the item currently in dispute.
#[utoipa::path(post, path = "/v1/bids", request_body = BidCreate,
responses(
    (status = 200, description = "The accepted bid", body = BidResult),
    (status = 400, response = dispute_api_types::ErrorBodyResponse)
),)]
pub async fn post_bid(
    State(store): State<Arc<StoreNew>>,
    headers: HeaderMap,
    Json(body): Json<BidCreate>,
) -> Result<Json<BidResult>, RestError> {
    let origin = requester_ip(&store, &headers);
    let bid = store
        .bid_service
        .submit_bid(SubmitBidInput {
            bid_create: entities::BidCreate {
                session_id: body.session_id,
                item_id:    body.item_id,
                bidder:     body.bidder,
                amount:     body.amount,
                origin,
            },
        })
        .await?;
    Ok(Json(BidResult {
        status: "OK".to_string(),
        id:     bid.id,
    }))
}

/// Cancel a bid with a recorded justification. Auctioneer only.
#[utoipa::path(post, path = "/v1/bids/cancel", request_body = BidCancel,
responses(
    (status = 200, description = "Bid cancelled"),
    (status = 404, response = dispute_api_types::ErrorBodyResponse)
),)]
pub async fn cancel_bid(
    State(store): State<Arc<StoreNew>>,
    auth: Auth,
    Json(body): Json<BidCancel>,
) -> Result<(), RestError> {
    auth.require_operator(&store)?;
    let session = store
        .session_service
        .get_in_memory_session(body.session_id)
        .await?;
    store
        .bid_service
        .cancel_bid(CancelBidInput {
            session_id:    body.session_id,
            bid_id:        body.bid_id,
            justification: body.justification,
            actor:         session.auctioneer_name,
        })
        .await
}

/// Ranked bids for the item currently in dispute, masked for display.
#[utoipa::path(get, path = "/v1/sessions/{session_id}/bids",
params(("session_id" = String, Path, description = "Session id")),
responses((status = 200, description = "Ranked bids, best first", body = Vec<RankedBid>)),)]
pub async fn get_bids(
    State(store): State<Arc<StoreNew>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Vec<RankedBid>>, RestError> {
    let session = store
        .session_service
        .get_in_memory_session(session_id)
        .await?;
    let bids = match session.current_item_id {
        Some(item_id) => {
            store
                .bid_service
                .get_ranked_bids(session_id, item_id)
                .await?
        }
        None => Vec::new(),
    };
    Ok(Json(
        bids.iter()
            .enumerate()
            .map(|(index, bid)| RankedBid {
                id:           bid.id,
                bidder_label: mask_handle(&bid.bidder),
                amount:       bid.amount,
                placed_at:    bid.created_at,
                rank:         index + 1,
            })
            .collect(),
    ))
}
