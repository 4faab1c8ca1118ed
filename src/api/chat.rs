//! Chat call orchestration
//!
//! Validates input, threads the conversation identifier through the backend,
//! and persists whatever identifier the backend hands back. The transport
//! itself lives behind [`ChatBackend`].

use async_trait::async_trait;
use serde::Serialize;

use crate::api::ApiError;
use crate::models::ChatEntry;
use crate::storage::SessionStore;

/// Body sent to the chat flow
#[derive(Serialize, Clone, Debug)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: String, // Server-issued id, or "new"
    pub user_id: String,         // The session's email
}

/// Assembled chat result
#[derive(Clone, Debug)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub usage: Option<serde_json::Value>,
    pub request_id: Option<String>,
}

/// Transport seam for the chat flow
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one chat request to completion, however the transport does it
    async fn run_chat(
        &self,
        session_token: &str,
        request: &ChatRequest,
    ) -> Result<ChatReply, ApiError>;
}

/// Chat client bound to a session store and a transport
pub struct ChatClient<B> {
    backend: B,
    store: SessionStore,
}

impl<B: ChatBackend> ChatClient<B> {
    #[must_use]
    pub fn new(backend: B, store: SessionStore) -> Self {
        Self { backend, store }
    }

    /// Send one chat message
    ///
    /// Requires a persisted session. The message is trimmed; empty input is
    /// rejected before any network traffic. When `conversation_id` is not
    /// given, the persisted identifier is used, falling back to `"new"`.
    /// Any identifier the backend returns is persisted for the next call,
    /// and the completed exchange is appended to the stored history.
    ///
    /// # Errors
    ///
    /// [`ApiError::NoSession`] without a session, [`ApiError::EmptyMessage`]
    /// for blank input, and the transport's own error kinds otherwise
    pub async fn chat(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        let session = self.store.session().ok_or(ApiError::NoSession)?;

        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(ApiError::EmptyMessage);
        }

        let conversation = conversation_id
            .map(ToString::to_string)
            .or_else(|| self.store.conversation_id())
            .unwrap_or_else(|| "new".to_string());

        let request = ChatRequest {
            message: trimmed.to_string(),
            conversation_id: conversation.clone(),
            user_id: session.email.clone(),
        };

        let mut reply = self
            .backend
            .run_chat(&session.session_token, &request)
            .await?;

        match &reply.conversation_id {
            Some(id) => self.store.set_conversation_id(id),
            None => reply.conversation_id = Some(conversation),
        }

        self.store.append_history(ChatEntry::now("user", trimmed));
        self.store
            .append_history(ChatEntry::now("assistant", reply.response.as_str()));
        Ok(reply)
    }

    /// Drop the current conversation id and history
    pub fn reset_conversation(&self) {
        self.store.clear_conversation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    struct RecordingBackend {
        calls: AtomicUsize,
        last_request: Mutex<Option<ChatRequest>>,
        returned_conversation: Option<String>,
    }

    impl RecordingBackend {
        fn returning(conversation: Option<&str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                returned_conversation: conversation.map(ToString::to_string),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        async fn run_chat(
            &self,
            session_token: &str,
            request: &ChatRequest,
        ) -> Result<ChatReply, ApiError> {
            assert_eq!(session_token, "tok_abcdef");
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(ChatReply {
                response: "hello back".to_string(),
                conversation_id: self.returned_conversation.clone(),
                message_id: Some("msg_1".to_string()),
                usage: None,
                request_id: None,
            })
        }
    }

    fn store_with_session() -> SessionStore {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        store
            .set_session(&Session {
                user_id: "u_42".to_string(),
                email: "user@example.com".to_string(),
                name: "User".to_string(),
                timestamp: 1_735_689_600,
                session_token: "tok_abcdef".to_string(),
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn chat_requires_a_session() {
        let client = ChatClient::new(
            RecordingBackend::returning(None),
            SessionStore::new(Arc::new(MemoryStorage::new())),
        );
        let err = client.chat("hello", None).await.unwrap_err();
        assert!(matches!(err, ApiError::NoSession));
        assert_eq!(client.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chat_rejects_blank_messages_before_any_traffic() {
        let client = ChatClient::new(RecordingBackend::returning(None), store_with_session());
        for message in ["", "   ", "\n\t "] {
            let err = client.chat(message, None).await.unwrap_err();
            assert!(matches!(err, ApiError::EmptyMessage));
        }
        assert_eq!(client.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chat_trims_message_and_defaults_to_new_conversation() {
        let client = ChatClient::new(RecordingBackend::returning(None), store_with_session());
        let reply = client.chat("  hi there  ", None).await.unwrap();

        let sent = client.backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.message, "hi there");
        assert_eq!(sent.conversation_id, "new");
        assert_eq!(sent.user_id, "user@example.com");
        // Backend returned no id, so the requested one is echoed back
        assert_eq!(reply.conversation_id, Some("new".to_string()));
    }

    #[tokio::test]
    async fn returned_conversation_id_is_persisted_and_reused() {
        let store = store_with_session();
        let client = ChatClient::new(RecordingBackend::returning(Some("conv_7")), store.clone());

        let reply = client.chat("first", None).await.unwrap();
        assert_eq!(reply.conversation_id, Some("conv_7".to_string()));
        assert_eq!(store.conversation_id(), Some("conv_7".to_string()));

        client.chat("second", None).await.unwrap();
        let sent = client.backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.conversation_id, "conv_7");
    }

    #[tokio::test]
    async fn explicit_conversation_id_wins_over_persisted_one() {
        let store = store_with_session();
        store.set_conversation_id("conv_7");
        let client = ChatClient::new(RecordingBackend::returning(None), store);

        client.chat("hello", Some("conv_override")).await.unwrap();
        let sent = client.backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.conversation_id, "conv_override");
    }

    #[tokio::test]
    async fn chat_appends_the_exchange_to_history() {
        let store = store_with_session();
        let client = ChatClient::new(RecordingBackend::returning(None), store.clone());
        client.chat("  hello  ", None).await.unwrap();

        let history = store.conversation_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[1].content, "hello back");
    }

    #[tokio::test]
    async fn reset_conversation_clears_persisted_id() {
        let store = store_with_session();
        store.set_conversation_id("conv_7");
        let client = ChatClient::new(RecordingBackend::returning(None), store.clone());

        client.reset_conversation();
        assert_eq!(store.conversation_id(), None);

        client.chat("fresh start", None).await.unwrap();
        let sent = client.backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.conversation_id, "new");
    }
}
