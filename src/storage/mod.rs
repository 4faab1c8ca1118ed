//! Local persistence for the portal client
//!
//! The browser surfaces share session state through a per-origin key-value
//! medium. The headless client keeps the same shape: a [`StorageBackend`]
//! key-value seam with a JSON-file implementation for real use and an
//! in-memory one for tests, and a [`SessionStore`] that owns the well-known
//! keys on top of it.

mod backend;
mod session_store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend, StorageError};
pub use session_store::{AuthGuard, SessionStore};
