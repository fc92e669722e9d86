// Assistant chat endpoint.
//
// Stateless on the backend: every request carries the whole history.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ChatReply, ChatRequest};

impl ApiClient {
    /// `POST /ai/chat` with `{message, history}`
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, Error> {
        debug!(history = request.history.len(), "sending chat message");
        self.post("/ai/chat", request).await
    }
}
