use {
    super::Repository,
    crate::{
        api::RestError,
        session::entities,
    },
};

impl Repository {
    pub async fn add_chat_message(
        &self,
        message: entities::ChatMessage,
    ) -> Result<entities::ChatMessage, RestError> {
        self.db.add_chat_message(&message).await?;
        self.in_memory_store
            .chat
            .write()
            .await
            .entry(message.session_id)
            .or_insert_with(Vec::new)
            .push(message.clone());
        Ok(message)
    }
}
