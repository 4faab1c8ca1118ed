//! Platform authenticator seam
//!
//! The public-key-credential capability is the one external dependency the
//! handshake cannot own: credential creation and assertion happen inside the
//! platform (biometric prompt, PIN, security key) and may suspend
//! indefinitely or be dismissed by the user. The client consumes it as an
//! opaque capability behind this trait; user dismissal is an expected
//! outcome, not a generic failure.

use std::fmt;

use async_trait::async_trait;

use crate::passkey::types::{
    CreatedCredential, CredentialAssertion, CredentialAssertionRequest, CredentialCreationRequest,
};

/// Failures surfaced by the platform credential capability
#[derive(Debug)]
pub enum AuthenticatorError {
    /// The user or platform dismissed the ceremony ("not allowed")
    Cancelled(String),
    /// No credential capability is present on this platform
    Unavailable(String),
    /// Any other platform failure
    Failed(String),
}

impl fmt::Display for AuthenticatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticatorError::Cancelled(msg) => write!(f, "Ceremony cancelled: {msg}"),
            AuthenticatorError::Unavailable(msg) => {
                write!(f, "Platform credentials unavailable: {msg}")
            }
            AuthenticatorError::Failed(msg) => write!(f, "Authenticator failure: {msg}"),
        }
    }
}

impl std::error::Error for AuthenticatorError {}

/// Platform-native public-key-credential capability
///
/// Implementations bridge to whatever the host platform provides. Calls may
/// suspend until the user completes or dismisses the prompt; no timeout is
/// imposed here beyond what the platform itself enforces.
#[async_trait]
pub trait PlatformAuthenticator: Send + Sync {
    /// Create a new credential for the decoded registration options
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticatorError::Cancelled`] when the user or platform
    /// dismisses the prompt, [`AuthenticatorError::Failed`] otherwise
    async fn create_credential(
        &self,
        request: &CredentialCreationRequest,
    ) -> Result<CreatedCredential, AuthenticatorError>;

    /// Produce an assertion for the decoded authentication options
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticatorError::Cancelled`] when the user or platform
    /// dismisses the prompt, [`AuthenticatorError::Failed`] otherwise
    async fn get_assertion(
        &self,
        request: &CredentialAssertionRequest,
    ) -> Result<CredentialAssertion, AuthenticatorError>;

    /// Feature detection: whether the capability is present at all
    fn is_available(&self) -> bool {
        true
    }
}

impl From<AuthenticatorError> for crate::passkey::PasskeyError {
    fn from(err: AuthenticatorError) -> Self {
        match err {
            AuthenticatorError::Cancelled(msg) => crate::passkey::PasskeyError::Cancelled(msg),
            AuthenticatorError::Unavailable(msg) | AuthenticatorError::Failed(msg) => {
                crate::passkey::PasskeyError::Authenticator(msg)
            }
        }
    }
}
