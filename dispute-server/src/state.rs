use {
    crate::{
        api::ws::WsState,
        audit,
        bid,
        kernel::db::DB,
        session,
    },
    std::sync::Arc,
    tokio_util::task::TaskTracker,
};

pub struct Store {
    pub db:             DB,
    pub ws:             WsState,
    pub operator_token: String,
}

pub struct StoreNew {
    pub store:           Arc<Store>,
    pub session_service: session::Service,
    pub bid_service:     bid::Service,
    pub audit_service:   audit::Service,
    pub task_tracker:    TaskTracker,
}
