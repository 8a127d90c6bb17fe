#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::db::DB,
    },
    axum::async_trait,
    std::fmt::Debug,
    tracing::instrument,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_bid(&self, bid: &entities::Bid) -> Result<(), RestError>;
    async fn cancel_bid(&self, bid_id: entities::BidId) -> Result<(), RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_bid",
        fields(category = "db_queries", result = "success", name = "add_bid"),
        skip_all
    )]
    async fn add_bid(&self, bid: &entities::Bid) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO bid (id, session_id, item_id, bidder, amount, origin, cancelled, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(bid.id)
        .bind(bid.session_id)
        .bind(bid.item_id)
        .bind(&bid.bidder)
        .bind(bid.amount)
        .bind(&bid.origin)
        .bind(bid.cancelled)
        .bind(bid.created_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), bid_id = %bid.id, "DB: Failed to insert bid");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_cancel_bid",
        fields(category = "db_queries", result = "success", name = "cancel_bid"),
        skip_all
    )]
    async fn cancel_bid(&self, bid_id: entities::BidId) -> Result<(), RestError> {
        sqlx::query("UPDATE bid SET cancelled = TRUE WHERE id = $1")
            .bind(bid_id)
            .execute(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), bid_id = %bid_id, "DB: Failed to cancel bid");
                RestError::TemporarilyUnavailable
            })?;
        Ok(())
    }
}
