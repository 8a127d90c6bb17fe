use {
    super::Repository,
    crate::{
        kernel::entities::SessionId,
        session::entities,
    },
};

impl Repository {
    pub async fn get_in_memory_session(&self, session_id: SessionId) -> Option<entities::Session> {
        self.in_memory_store
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
    }
}
