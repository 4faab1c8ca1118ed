//! Remote handshake endpoints
//!
//! The backend is a remote job-execution service speaking JSON under the
//! standard response envelope. The trait exists so the handshake client can
//! be exercised against a scripted backend in tests; [`HttpAuthBackend`] is
//! the real implementation.

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{ApiEnvelope, Session};
use crate::passkey::types::{
    AuthenticationOptions, AuthenticationVerifyRequest, RegistrationOptions,
    RegistrationOptionsRequest, RegistrationVerifyRequest,
};
use crate::passkey::PasskeyError;
use crate::settings::{BackingResource, PortalSettings};

/// Remote surface of the passkey handshake
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Fetch registration challenge options for the given identity hints
    async fn registration_options(
        &self,
        request: &RegistrationOptionsRequest,
    ) -> Result<RegistrationOptions, PasskeyError>;

    /// Submit a created credential for verification
    async fn registration_verify(
        &self,
        request: &RegistrationVerifyRequest,
    ) -> Result<Session, PasskeyError>;

    /// Fetch authentication challenge options (no identity hints)
    async fn authentication_options(&self) -> Result<AuthenticationOptions, PasskeyError>;

    /// Submit an assertion for verification
    async fn authentication_verify(
        &self,
        request: &AuthenticationVerifyRequest,
    ) -> Result<Session, PasskeyError>;

    /// Notify the server that `session_token` is being discarded
    async fn notify_sign_out(&self, session_token: &str) -> Result<(), PasskeyError>;
}

/// HTTP implementation against the portal_auth flow endpoints
pub struct HttpAuthBackend {
    http: reqwest::Client,
    base_url: String,
    webhook_token: Option<String>,
    backing_resource: String,
}

// Wraps every request body with the environment's backing-resource selector
#[derive(Serialize)]
struct HandshakeBody<'a, T: Serialize> {
    #[serde(flatten)]
    payload: &'a T,
    resource: &'a str,
}

#[derive(Serialize)]
struct EmptyPayload {}

#[derive(Serialize)]
struct SignOutPayload<'a> {
    session_token: &'a str,
}

impl HttpAuthBackend {
    /// Build the backend from settings, resolving the environment once
    #[must_use]
    pub fn from_settings(settings: &PortalSettings) -> Self {
        let environment = settings.environment();
        let backing_resource = match environment.backing_resource {
            BackingResource::Production => "ax-pv1".to_string(),
            BackingResource::Preview => format!("ax-pv1-preview/{}", environment.relying_party_id),
        };
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/jobs/run_wait_result/p/f/portal_auth", settings.api.base_url),
            webhook_token: settings.api.webhook_token.clone(),
            backing_resource,
        }
    }

    async fn post_envelope<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        operation: &str,
        payload: &T,
        failure: &str,
    ) -> Result<ApiEnvelope<R>, PasskeyError> {
        let url = format!("{}/{operation}", self.base_url);
        debug!("POST {url}");

        let body = HandshakeBody {
            payload,
            resource: &self.backing_resource,
        };
        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.webhook_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PasskeyError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PasskeyError::Server(format!("{failure} (HTTP {status})")));
        }

        let envelope: ApiEnvelope<R> = response
            .json()
            .await
            .map_err(|e| PasskeyError::Server(format!("{failure}: malformed response ({e})")))?;
        if !envelope.success {
            return Err(PasskeyError::Server(envelope.error_message(failure)));
        }
        Ok(envelope)
    }

    async fn post<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        operation: &str,
        payload: &T,
        failure: &str,
    ) -> Result<R, PasskeyError> {
        let envelope = self.post_envelope(operation, payload, failure).await?;
        envelope
            .data
            .ok_or_else(|| PasskeyError::Server(format!("{failure}: response carried no data")))
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn registration_options(
        &self,
        request: &RegistrationOptionsRequest,
    ) -> Result<RegistrationOptions, PasskeyError> {
        self.post(
            "passkey_register_options",
            request,
            "Failed to get registration options",
        )
        .await
    }

    async fn registration_verify(
        &self,
        request: &RegistrationVerifyRequest,
    ) -> Result<Session, PasskeyError> {
        self.post(
            "passkey_register_verify",
            request,
            "Credential verification failed",
        )
        .await
    }

    async fn authentication_options(&self) -> Result<AuthenticationOptions, PasskeyError> {
        self.post(
            "passkey_authenticate_options",
            &EmptyPayload {},
            "Failed to get authentication options",
        )
        .await
    }

    async fn authentication_verify(
        &self,
        request: &AuthenticationVerifyRequest,
    ) -> Result<Session, PasskeyError> {
        self.post(
            "passkey_authenticate_verify",
            request,
            "Assertion verification failed",
        )
        .await
    }

    async fn notify_sign_out(&self, session_token: &str) -> Result<(), PasskeyError> {
        // The server acknowledges with a bare envelope; any data is unused
        self.post_envelope::<_, serde_json::Value>(
            "signout",
            &SignOutPayload { session_token },
            "Sign-out notification failed",
        )
        .await
        .map(|_| ())
    }
}
