use {
    super::repository::Repository,
    crate::{
        audit,
        session,
    },
    std::sync::Arc,
};

mod cancel_bid;
mod get_bids;
mod submit_bid;
mod verification;

pub use {
    cancel_bid::CancelBidInput,
    submit_bid::SubmitBidInput,
};

pub struct ServiceInner {
    repo:     Arc<Repository>,
    sessions: session::Service,
    audit:    audit::Service,
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
    pub fn new(repo: Arc<Repository>, sessions: session::Service, audit: audit::Service) -> Self {
        Self(Arc::new(ServiceInner {
            repo,
            sessions,
            audit,
        }))
    }
}
