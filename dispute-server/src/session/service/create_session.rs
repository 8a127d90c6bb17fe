use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::ProcurementId,
        session::entities,
    },
    std::time::Duration,
    time::OffsetDateTime,
    uuid::Uuid,
};

/// Inbound "procurement record confirmed ready for dispute" event: the
/// surrounding system supplies the item list and the auctioneer's display
/// name. Timing fields fall back to the configured defaults.
#[derive(Clone, Debug)]
pub struct CreateSessionInput {
    pub procurement_id:     ProcurementId,
    pub auctioneer_name:    String,
    pub items:              Vec<entities::DisputeItem>,
    pub inactivity_timeout: Option<Duration>,
    pub random_window_min:  Option<Duration>,
    pub random_window_max:  Option<Duration>,
}

impl Service {
    #[tracing::instrument(skip_all, fields(session_id, procurement_id = %input.procurement_id), err(level = tracing::Level::TRACE))]
    pub async fn create_session(
        &self,
        input: CreateSessionInput,
    ) -> Result<entities::Session, RestError> {
        if input.items.is_empty() {
            return Err(RestError::BadParameters(
                "A dispute session needs at least one item".to_string(),
            ));
        }
        let session = entities::Session::new(
            Uuid::new_v4(),
            input.procurement_id,
            input.auctioneer_name,
            input.items,
            input
                .inactivity_timeout
                .unwrap_or(self.config.inactivity_timeout),
            input
                .random_window_min
                .unwrap_or(self.config.random_window_min),
            input
                .random_window_max
                .unwrap_or(self.config.random_window_max),
            OffsetDateTime::now_utc(),
        );
        tracing::Span::current().record("session_id", session.id.to_string());
        self.repo.add_session(session.clone()).await?;
        Ok(session)
    }
}
