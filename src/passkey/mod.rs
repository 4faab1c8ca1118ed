//! Passkey (`WebAuthn`) handshake client
//!
//! One registration or authentication attempt is a three-step handshake:
//! options request, platform credential ceremony, verify request. The
//! remote surface and the platform capability are both trait seams.

mod authenticator;
mod backend;
mod client;
mod errors;
pub mod types;

pub use authenticator::{AuthenticatorError, PlatformAuthenticator};
pub use backend::{AuthBackend, HttpAuthBackend};
pub use client::PasskeyClient;
pub use errors::PasskeyError;
