use {
    super::Repository,
    crate::{
        kernel::entities::SessionId,
        session::entities,
    },
};

impl Repository {
    pub async fn get_in_memory_chat_messages(
        &self,
        session_id: SessionId,
    ) -> Vec<entities::ChatMessage> {
        self.in_memory_store
            .chat
            .read()
            .await
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }
}
