#[cfg(test)]
use mockall::automock;
use {
    super::repository::Repository,
    crate::{
        api::ws::UpdateEvent,
        audit,
        bid,
        state::Store,
    },
    rand::Rng,
    std::{
        sync::Arc,
        time::Duration,
    },
    tokio::sync::broadcast,
};

mod advance_phase;
mod begin_item_dispute;
mod cancel_session;
mod close_item_dispute;
mod create_session;
mod enter_random_window;
mod get_session_by_id;
mod get_snapshot;
mod record_bid;
mod resume_session;
mod send_chat_message;
mod start_session;
mod suspend_session;
mod teardown_session;
pub mod workers;

pub use {
    begin_item_dispute::BeginItemDisputeInput,
    cancel_session::CancelSessionInput,
    close_item_dispute::CloseItemDisputeInput,
    create_session::CreateSessionInput,
    send_chat_message::SendChatMessageInput,
    start_session::StartSessionInput,
    suspend_session::SuspendSessionInput,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub inactivity_timeout: Duration,
    pub random_window_min:  Duration,
    pub random_window_max:  Duration,
    pub tick_interval:      Duration,
}

/// Source of the random closing-window duration. Injectable so tests can pin
/// the sampled time instead of relying on a global random source.
#[cfg_attr(test, automock)]
pub trait WindowSampler: Send + Sync + 'static {
    fn sample_window(&self, min: Duration, max: Duration) -> Duration;
}

#[derive(Debug, Default)]
pub struct UniformWindowSampler;

impl WindowSampler for UniformWindowSampler {
    fn sample_window(&self, min: Duration, max: Duration) -> Duration {
        rand::thread_rng().gen_range(min..=max)
    }
}

pub struct ServiceInner {
    store:        Arc<Store>,
    repo:         Arc<Repository>,
    bids:         Arc<bid::repository::Repository>,
    audit:        audit::Service,
    config:       Config,
    sampler:      Arc<dyn WindowSampler>,
    event_sender: broadcast::Sender<UpdateEvent>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);

impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(
        store: Arc<Store>,
        repo: Arc<Repository>,
        bids: Arc<bid::repository::Repository>,
        audit: audit::Service,
        config: Config,
        sampler: Arc<dyn WindowSampler>,
        event_sender: broadcast::Sender<UpdateEvent>,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            store,
            repo,
            bids,
            audit,
            config,
            sampler,
            event_sender,
        }))
    }
}
