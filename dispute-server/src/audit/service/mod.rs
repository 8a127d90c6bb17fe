use {
    super::repository::Repository,
    crate::api::ws::UpdateEvent,
    std::sync::Arc,
    tokio::sync::broadcast,
};

pub mod append_event;
pub mod list_by_session;

pub struct ServiceInner {
    pub(super) repo:         Arc<Repository>,
    pub(super) event_sender: broadcast::Sender<UpdateEvent>,
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
    pub fn new(repo: Arc<Repository>, event_sender: broadcast::Sender<UpdateEvent>) -> Self {
        Self(Arc::new(ServiceInner { repo, event_sender }))
    }
}
