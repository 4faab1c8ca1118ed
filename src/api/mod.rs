//! Conversational API client
//!
//! A single `chat` request/response call against the job-execution backend,
//! over one configurable transport strategy: a direct run-and-wait request,
//! or a submitted job polled with bounded backoff.

mod chat;
mod transport;

use std::fmt;

pub use chat::{ChatBackend, ChatClient, ChatReply, ChatRequest};
pub use transport::{HttpChatBackend, PollingConfig, Transport};

/// Errors surfaced by the conversational API client
#[derive(Debug)]
pub enum ApiError {
    /// No session is persisted; the call requires one
    NoSession,
    /// The message was empty after trimming
    EmptyMessage,
    /// Connectivity failure reaching the backend
    Network(String),
    /// HTTP non-success status or `success = false` in the response body
    Server(String),
    /// The polling transport exhausted its attempt budget
    Timeout(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NoSession => write!(f, "No active session"),
            ApiError::EmptyMessage => write!(f, "Message cannot be empty"),
            ApiError::Network(msg) => {
                write!(f, "Network error - please check your connection ({msg})")
            }
            ApiError::Server(msg) => write!(f, "API request failed: {msg}"),
            ApiError::Timeout(msg) => write!(f, "Timed out waiting for the job: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}
