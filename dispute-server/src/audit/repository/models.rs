#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::SessionId,
        },
    },
    axum::async_trait,
    rust_decimal::Decimal,
    sqlx::FromRow,
    std::{
        fmt::Debug,
        str::FromStr,
    },
    time::OffsetDateTime,
    tracing::instrument,
    uuid::Uuid,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_event(&self, event: &entities::AuditEvent) -> Result<(), RestError>;
    async fn get_events(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<entities::AuditEvent>, RestError>;
}

#[derive(Clone, FromRow, Debug)]
pub struct EventRow {
    pub id:          Uuid,
    pub session_id:  Uuid,
    pub kind:        String,
    pub description: String,
    pub item_id:     Option<Uuid>,
    pub bidder:      Option<String>,
    pub bid_id:      Option<Uuid>,
    pub amount:      Option<Decimal>,
    pub actor:       String,
    pub payload:     Option<serde_json::Value>,
    pub occurred_at: OffsetDateTime,
}

impl EventRow {
    pub fn get_event_entity(&self) -> anyhow::Result<entities::AuditEvent> {
        Ok(entities::AuditEvent {
            id:          self.id,
            session_id:  self.session_id,
            kind:        entities::EventKind::from_str(&self.kind)?,
            description: self.description.clone(),
            item_id:     self.item_id,
            bidder:      self.bidder.clone(),
            bid_id:      self.bid_id,
            amount:      self.amount,
            actor:       entities::Actor::parse(&self.actor),
            payload:     self.payload.clone(),
            occurred_at: self.occurred_at,
        })
    }
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_event",
        fields(category = "db_queries", result = "success", name = "add_event"),
        skip_all
    )]
    async fn add_event(&self, event: &entities::AuditEvent) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO session_event (id, session_id, kind, description, item_id, bidder, bid_id, amount, actor, payload, occurred_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(event.session_id)
        .bind(event.kind.to_string())
        .bind(&event.description)
        .bind(event.item_id)
        .bind(&event.bidder)
        .bind(event.bid_id)
        .bind(event.amount)
        .bind(event.actor.to_string())
        .bind(&event.payload)
        .bind(event.occurred_at)
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), event_id = %event.id, "DB: Failed to insert session event");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_events",
        fields(category = "db_queries", result = "success", name = "get_events"),
        skip_all
    )]
    async fn get_events(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<entities::AuditEvent>, RestError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM session_event WHERE session_id = $1 ORDER BY occurred_at ASC",
        )
        .bind(session_id)
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), session_id = %session_id, "DB: Failed to fetch session events");
            RestError::TemporarilyUnavailable
        })?;
        rows.iter()
            .map(|row| {
                row.get_event_entity().map_err(|e| {
                    tracing::error!(error = e.to_string(), event_id = %row.id, "Failed to convert event row to entity");
                    RestError::TemporarilyUnavailable
                })
            })
            .collect()
    }
}
