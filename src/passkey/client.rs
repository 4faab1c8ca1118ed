//! Passkey handshake client
//!
//! Drives the three-step flow for one registration or authentication
//! attempt: options request, platform ceremony, verify request. Each attempt
//! is terminal on the first success or the first failure; there are no
//! retries and no application-level timeout. The verified session is written
//! into the store before it is returned.

use log::{debug, info, warn};

use crate::models::Session;
use crate::passkey::authenticator::PlatformAuthenticator;
use crate::passkey::backend::AuthBackend;
use crate::passkey::types::{
    AuthenticationVerifyRequest, RegistrationOptionsRequest, RegistrationVerifyRequest,
};
use crate::passkey::PasskeyError;
use crate::storage::SessionStore;

/// Orchestrates passkey registration, authentication and sign-out
pub struct PasskeyClient<B, A> {
    backend: B,
    authenticator: A,
    store: SessionStore,
}

impl<B: AuthBackend, A: PlatformAuthenticator> PasskeyClient<B, A> {
    #[must_use]
    pub fn new(backend: B, authenticator: A, store: SessionStore) -> Self {
        Self {
            backend,
            authenticator,
            store,
        }
    }

    /// The session store this client commits verified sessions into
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Feature detection for the platform credential capability
    #[must_use]
    pub fn supports_passkeys(&self) -> bool {
        self.authenticator.is_available()
    }

    /// Register a new passkey for `email` / `name`
    ///
    /// # Errors
    ///
    /// Fails with [`PasskeyError::Server`] or [`PasskeyError::Network`] on a
    /// rejected round-trip, [`PasskeyError::Cancelled`] when the ceremony is
    /// dismissed, and [`PasskeyError::Storage`] when the verified session
    /// cannot be persisted
    pub async fn register(&self, email: &str, name: &str) -> Result<Session, PasskeyError> {
        debug!("Passkey registration: requesting options for {email}");
        let options = self
            .backend
            .registration_options(&RegistrationOptionsRequest {
                email: email.to_string(),
                name: name.to_string(),
            })
            .await?;
        let creation_request = options.decode()?;

        debug!("Passkey registration: awaiting platform credential");
        let credential = self
            .authenticator
            .create_credential(&creation_request)
            .await?;

        debug!("Passkey registration: verifying credential with server");
        let session = self
            .backend
            .registration_verify(&RegistrationVerifyRequest::new(email, &credential))
            .await?;

        self.store.set_session(&session)?;
        info!("Passkey registration committed for user {}", session.user_id);
        Ok(session)
    }

    /// Authenticate with an existing passkey
    ///
    /// No identity hints are sent; the server and authenticator discover the
    /// credential between them.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::register`]
    pub async fn authenticate(&self) -> Result<Session, PasskeyError> {
        debug!("Passkey authentication: requesting options");
        let options = self.backend.authentication_options().await?;
        let assertion_request = options.decode()?;

        debug!("Passkey authentication: awaiting platform assertion");
        let assertion = self.authenticator.get_assertion(&assertion_request).await?;

        debug!("Passkey authentication: verifying assertion with server");
        let session = self
            .backend
            .authentication_verify(&AuthenticationVerifyRequest::new(&assertion))
            .await?;

        self.store.set_session(&session)?;
        info!(
            "Passkey authentication committed for user {}",
            session.user_id
        );
        Ok(session)
    }

    /// Sign out: local state wins, the server is told best-effort
    ///
    /// The local session is cleared first. The notification call is made
    /// once with the outgoing token; its failure is logged and never
    /// surfaced or retried, since local state already reflects the desired
    /// outcome.
    pub async fn sign_out(&self) {
        let outgoing = self.store.session();
        self.store.clear_session();

        let Some(session) = outgoing else { return };
        if session.session_token.is_empty() {
            return;
        }
        if let Err(e) = self.backend.notify_sign_out(&session.session_token).await {
            warn!("Server sign-out failed (local session cleared): {e}");
        }
    }
}
