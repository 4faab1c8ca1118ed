//! Shared data types for the portal client
//!
//! This module defines the persisted session record, the JSON envelope every
//! backend response is wrapped in, and the chat-history entry format.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Verified portal session, as returned by the backend and persisted locally
///
/// A session is either fully absent or fully populated; partial records are
/// never written. The record is overwritten wholesale on re-login and removed
/// on sign-out. No client-side expiry is enforced.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,       // User identifier
    pub email: String,         // User email
    pub name: String,          // User display name
    pub timestamp: i64,        // Login timestamp (epoch seconds)
    pub session_token: String, // Opaque bearer credential
}

impl Session {
    /// Whether the record carries the fields required to authorize requests
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.session_token.is_empty() && !self.user_id.is_empty()
    }
}

/// Standard response envelope used by every backend endpoint
///
/// `success = false` carries an application-level failure even when the HTTP
/// status is 200; callers must check the flag before touching `data`.
#[derive(Deserialize, Debug)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    // No `default` attribute here: it would put a `T: Default` bound on the
    // derived impl, and handshake payloads have no Default
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Human-readable failure message, falling back when the body omits one
    #[must_use]
    pub fn error_message(&self, fallback: &str) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Application-level error details inside a failed envelope
#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request-level metadata returned alongside the payload
#[derive(Deserialize, Debug)]
pub struct ResponseMeta {
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// One entry in the locally persisted chat history
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: String,    // "user" or "assistant"
    pub content: String, // Message text
    pub timestamp: i64,  // Epoch seconds
}

impl ChatEntry {
    /// Entry stamped with the current time
    #[must_use]
    pub fn now(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_completeness_requires_token_and_user_id() {
        let session = Session {
            user_id: "u_1".to_string(),
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            timestamp: 1_700_000_000,
            session_token: "tok".to_string(),
        };
        assert!(session.is_complete());

        let missing_token = Session {
            session_token: String::new(),
            ..session.clone()
        };
        assert!(!missing_token.is_complete());

        let missing_user = Session {
            user_id: String::new(),
            ..session
        };
        assert!(!missing_user.is_complete());
    }

    #[test]
    fn envelope_parses_missing_data_for_non_default_payloads() {
        // Session has no Default impl; an absent data field must still parse
        let envelope: ApiEnvelope<Session> = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn envelope_error_message_prefers_body_message() {
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(
            r#"{"success": false, "error": {"code": "AUTH_001", "message": "challenge expired"}}"#,
        )
        .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error_message("fallback"), "challenge expired");
    }

    #[test]
    fn envelope_error_message_falls_back_when_body_is_bare() {
        let envelope: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(envelope.error_message("verify failed"), "verify failed");
    }
}
