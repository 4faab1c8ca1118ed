//! Session store
//!
//! Owns the well-known storage keys shared with the portal web surfaces:
//! the JSON session record, the conversation id, and the chat history array.
//! Reads fail soft (malformed state is treated as absent); session writes
//! propagate storage rejection so a caller knows the login did not stick.

use std::sync::Arc;

use log::{error, warn};

use crate::models::{ChatEntry, Session};
use crate::settings::PortalSettings;
use crate::storage::{FileStorage, StorageBackend, StorageError};

// Key names must match the web surfaces for cross-surface session sharing
const SESSION_KEY: &str = "stom_session";
const CONVERSATION_KEY: &str = "ax_conversation_id";
const CONVERSATION_HISTORY_KEY: &str = "ax_conversation_history";

const DEFAULT_LOGIN_LOCATION: &str = "/login.html";

type RedirectHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Outcome of [`SessionStore::require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthGuard {
    /// A usable session is present
    Authorized,
    /// No usable session; the user agent was sent to the login surface
    RedirectedToLogin(String),
}

/// Persistent session state on top of an injected storage backend
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    login_location: String,
    redirect_hook: Option<RedirectHook>,
}

impl SessionStore {
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            login_location: DEFAULT_LOGIN_LOCATION.to_string(),
            redirect_hook: None,
        }
    }

    /// Store over the configured state file
    #[must_use]
    pub fn from_settings(settings: &PortalSettings) -> Self {
        Self::new(Arc::new(FileStorage::new(
            settings.storage.state_path.clone(),
        )))
    }

    /// Override the location unauthenticated callers are redirected to
    #[must_use]
    pub fn with_login_location(mut self, location: impl Into<String>) -> Self {
        self.login_location = location.into();
        self
    }

    /// Install the navigation side effect fired by [`Self::require_auth`]
    #[must_use]
    pub fn with_redirect_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.redirect_hook = Some(Arc::new(hook));
        self
    }

    /// Current session, if a well-formed record is persisted
    ///
    /// Malformed persisted data is logged and treated as absent; this
    /// accessor never errors.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        let raw = match self.backend.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                error!("Error reading session: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                error!("Error reading session: malformed record ({e})");
                None
            }
        }
    }

    /// Persist `session`, replacing any existing record wholesale
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] when the medium rejects the write;
    /// the caller must know the session did not persist.
    pub fn set_session(&self, session: &Session) -> Result<(), StorageError> {
        let raw = serde_json::to_string(session).map_err(|e| StorageError::Write(e.to_string()))?;
        self.backend.set(SESSION_KEY, &raw)
    }

    /// Remove the persisted session record (best effort)
    pub fn clear_session(&self) {
        if let Err(e) = self.backend.remove(SESSION_KEY) {
            error!("Error clearing session: {e}");
        }
    }

    /// Whether a session is present with a non-empty token and user id
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some_and(|s| s.is_complete())
    }

    /// Guard for protected surfaces
    ///
    /// When unauthenticated this fires the configured redirect hook (a
    /// navigation side effect, not a pure check) and reports the redirect.
    pub fn require_auth(&self) -> AuthGuard {
        if self.is_authenticated() {
            return AuthGuard::Authorized;
        }
        warn!(
            "Unauthenticated access to a protected surface, redirecting to {}",
            self.login_location
        );
        if let Some(hook) = &self.redirect_hook {
            hook(&self.login_location);
        }
        AuthGuard::RedirectedToLogin(self.login_location.clone())
    }

    /// Conversation id threaded through chat calls, if any
    #[must_use]
    pub fn conversation_id(&self) -> Option<String> {
        match self.backend.get(CONVERSATION_KEY) {
            Ok(id) => id,
            Err(e) => {
                error!("Error reading conversation ID: {e}");
                None
            }
        }
    }

    /// Persist the conversation id returned by the backend (best effort)
    pub fn set_conversation_id(&self, conversation_id: &str) {
        if let Err(e) = self.backend.set(CONVERSATION_KEY, conversation_id) {
            error!("Error storing conversation ID: {e}");
        }
    }

    /// Drop the conversation id and its history (start a fresh conversation)
    pub fn clear_conversation(&self) {
        if let Err(e) = self.backend.remove(CONVERSATION_KEY) {
            error!("Error clearing conversation ID: {e}");
        }
        if let Err(e) = self.backend.remove(CONVERSATION_HISTORY_KEY) {
            error!("Error clearing conversation history: {e}");
        }
    }

    /// Persisted chat history; malformed or unreadable state yields an
    /// empty list
    #[must_use]
    pub fn conversation_history(&self) -> Vec<ChatEntry> {
        let raw = match self.backend.get(CONVERSATION_HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Error reading conversation history: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error reading conversation history: malformed record ({e})");
                Vec::new()
            }
        }
    }

    /// Replace the persisted chat history (best effort)
    pub fn save_conversation_history(&self, entries: &[ChatEntry]) {
        match serde_json::to_string(entries) {
            Ok(raw) => {
                if let Err(e) = self.backend.set(CONVERSATION_HISTORY_KEY, &raw) {
                    error!("Error saving conversation history: {e}");
                }
            }
            Err(e) => error!("Error saving conversation history: {e}"),
        }
    }

    /// Append one entry to the persisted chat history (best effort)
    pub fn append_history(&self, entry: ChatEntry) {
        let mut entries = self.conversation_history();
        entries.push(entry);
        self.save_conversation_history(&entries);
    }
}
