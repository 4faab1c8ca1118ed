#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Headless client for the SixTwoOne Mind portal
//!
//! Three cooperating pieces: a passkey (`WebAuthn`) handshake client that
//! registers and authenticates against the remote job-execution backend, a
//! session store over an injected key-value backend, and a conversational
//! API client with a configurable transport. Server-side verification and
//! the platform credential capability itself are out of scope; both are
//! consumed through trait seams.

/// Version of the portal client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod models;
pub mod passkey;
pub mod settings;
pub mod storage;
pub mod utils;

/// Re-export commonly used items
pub use api::{ApiError, ChatClient, HttpChatBackend, Transport};
pub use models::Session;
pub use passkey::{PasskeyClient, PasskeyError, PlatformAuthenticator};
pub use settings::{Environment, PortalSettings};
pub use storage::{FileStorage, MemoryStorage, SessionStore, StorageBackend};
