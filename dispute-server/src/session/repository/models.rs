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
    async fn add_session(&self, session: &entities::Session) -> Result<(), RestError>;
    async fn update_session(&self, session: &entities::Session) -> Result<(), RestError>;
    async fn add_chat_message(&self, message: &entities::ChatMessage) -> Result<(), RestError>;
}

fn items_json(session: &entities::Session) -> Result<serde_json::Value, RestError> {
    serde_json::to_value(&session.items).map_err(|e| {
        tracing::error!(error = e.to_string(), session_id = %session.id, "Failed to serialize session items");
        RestError::TemporarilyUnavailable
    })
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_session",
        fields(category = "db_queries", result = "success", name = "add_session"),
        skip_all
    )]
    async fn add_session(&self, session: &entities::Session) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO dispute_session (id, procurement_id, auctioneer_name, status, phase, current_item_id, items, inactivity_timeout_secs, random_window_min_secs, random_window_max_secs, extensions_used, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(session.id)
        .bind(session.procurement_id)
        .bind(&session.auctioneer_name)
        .bind(session.status.to_string())
        .bind(session.phase.to_string())
        .bind(session.current_item_id)
        .bind(items_json(session)?)
        .bind(session.timing.inactivity_timeout.as_secs() as i64)
        .bind(session.timing.random_window_min.as_secs() as i64)
        .bind(session.timing.random_window_max.as_secs() as i64)
        .bind(session.timing.extensions_used as i32)
        .bind(session.created_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), session_id = %session.id, "DB: Failed to insert session");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_update_session",
        fields(category = "db_queries", result = "success", name = "update_session"),
        skip_all
    )]
    async fn update_session(&self, session: &entities::Session) -> Result<(), RestError> {
        sqlx::query(
            "UPDATE dispute_session SET status = $2, phase = $3, current_item_id = $4, items = $5, last_bid_at = $6, random_window_started_at = $7, random_window_secs = $8, extensions_used = $9, suspension_reason = $10, started_at = $11, closed_at = $12 WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.status.to_string())
        .bind(session.phase.to_string())
        .bind(session.current_item_id)
        .bind(items_json(session)?)
        .bind(session.timing.last_bid_at)
        .bind(session.timing.random_window_started_at)
        .bind(
            session
                .timing
                .random_window_duration
                .map(|duration| duration.as_secs() as i64),
        )
        .bind(session.timing.extensions_used as i32)
        .bind(&session.suspension_reason)
        .bind(session.started_at)
        .bind(session.closed_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), session_id = %session.id, "DB: Failed to update session");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_add_chat_message",
        fields(category = "db_queries", result = "success", name = "add_chat_message"),
        skip_all
    )]
    async fn add_chat_message(&self, message: &entities::ChatMessage) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO chat_message (id, session_id, sender_label, sender_role, body, sent_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(message.session_id)
        .bind(&message.sender_label)
        .bind(message.sender_role.to_string())
        .bind(&message.body)
        .bind(message.sent_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), session_id = %message.session_id, "DB: Failed to insert chat message");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }
}
