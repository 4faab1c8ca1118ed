//! Passkey handshake error types
//!
//! Cancellation gets its own variant so callers can render "cancelled"
//! instead of "error"; a verify-step rejection never maps to it.

use std::fmt;

use crate::storage::StorageError;

/// Errors that can fail a registration or authentication handshake
#[derive(Debug)]
pub enum PasskeyError {
    /// Connectivity failure reaching the backend (DNS, TLS, refused)
    Network(String),

    /// HTTP non-success status or `success = false` in the response body
    Server(String),

    /// The user or platform dismissed the credential ceremony
    Cancelled(String),

    /// The platform authenticator failed for a reason other than dismissal
    Authenticator(String),

    /// Base64url decoding of a server-issued binary field failed
    Encoding(String),

    /// The verified session could not be persisted
    Storage(StorageError),
}

impl fmt::Display for PasskeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasskeyError::Network(msg) => write!(f, "Network error: {msg}"),
            PasskeyError::Server(msg) => write!(f, "Server rejected the request: {msg}"),
            PasskeyError::Cancelled(msg) => write!(f, "Ceremony was cancelled or not allowed: {msg}"),
            PasskeyError::Authenticator(msg) => write!(f, "Authenticator error: {msg}"),
            PasskeyError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            PasskeyError::Storage(err) => write!(f, "Session storage error: {err}"),
        }
    }
}

impl std::error::Error for PasskeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PasskeyError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for PasskeyError {
    fn from(err: StorageError) -> Self {
        PasskeyError::Storage(err)
    }
}

impl From<base64::DecodeError> for PasskeyError {
    fn from(err: base64::DecodeError) -> Self {
        PasskeyError::Encoding(err.to_string())
    }
}
