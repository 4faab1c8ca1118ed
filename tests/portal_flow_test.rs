//! End-to-end flow over real file-backed storage: register a passkey,
//! share the session across a second surface, chat, sign out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stom_portal::api::{ApiError, ChatBackend, ChatClient, ChatReply, ChatRequest};
use stom_portal::passkey::types::{
    AuthenticationOptions, AuthenticationVerifyRequest, CreatedCredential, CredentialAssertion,
    CredentialAssertionRequest, CredentialCreationRequest, RegistrationOptions,
    RegistrationOptionsRequest, RegistrationVerifyRequest,
};
use stom_portal::passkey::{AuthBackend, AuthenticatorError, PasskeyError, PlatformAuthenticator};
use stom_portal::storage::AuthGuard;
use stom_portal::{FileStorage, PasskeyClient, Session, SessionStore};

fn sample_session() -> Session {
    Session {
        user_id: "u_42".to_string(),
        email: "user@example.com".to_string(),
        name: "Sample User".to_string(),
        timestamp: 1_735_689_600,
        session_token: "tok_abcdef".to_string(),
    }
}

struct StubBackend {
    sign_out_calls: AtomicUsize,
}

#[async_trait]
impl AuthBackend for StubBackend {
    async fn registration_options(
        &self,
        request: &RegistrationOptionsRequest,
    ) -> Result<RegistrationOptions, PasskeyError> {
        assert_eq!(request.email, "user@example.com");
        Ok(serde_json::from_str(
            r#"{
                "challenge": "AQID",
                "rp": {"id": "sixtwoonemind.com", "name": "SixTwoOne Mind"},
                "user": {"id": "dV80Mg", "name": "user@example.com", "displayName": "Sample User"},
                "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
                "timeout": 60000
            }"#,
        )
        .unwrap())
    }

    async fn registration_verify(
        &self,
        request: &RegistrationVerifyRequest,
    ) -> Result<Session, PasskeyError> {
        // The credential's binary fields come back base64url re-encoded
        assert_eq!(request.credential.raw_id, "Y3JlZF8x");
        Ok(sample_session())
    }

    async fn authentication_options(&self) -> Result<AuthenticationOptions, PasskeyError> {
        Ok(serde_json::from_str(r#"{"challenge": "BAUG", "rpId": "sixtwoonemind.com"}"#).unwrap())
    }

    async fn authentication_verify(
        &self,
        _request: &AuthenticationVerifyRequest,
    ) -> Result<Session, PasskeyError> {
        Ok(sample_session())
    }

    async fn notify_sign_out(&self, session_token: &str) -> Result<(), PasskeyError> {
        assert_eq!(session_token, "tok_abcdef");
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct StubAuthenticator;

#[async_trait]
impl PlatformAuthenticator for StubAuthenticator {
    async fn create_credential(
        &self,
        request: &CredentialCreationRequest,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        assert_eq!(request.challenge, vec![1, 2, 3]);
        assert_eq!(request.rp.id, "sixtwoonemind.com");
        Ok(CreatedCredential {
            id: "Y3JlZF8x".to_string(),
            raw_id: b"cred_1".to_vec(),
            client_data_json: b"{\"type\":\"webauthn.create\"}".to_vec(),
            attestation_object: vec![0xa0],
        })
    }

    async fn get_assertion(
        &self,
        request: &CredentialAssertionRequest,
    ) -> Result<CredentialAssertion, AuthenticatorError> {
        assert_eq!(request.challenge, vec![4, 5, 6]);
        Ok(CredentialAssertion {
            id: "Y3JlZF8x".to_string(),
            raw_id: b"cred_1".to_vec(),
            client_data_json: b"{\"type\":\"webauthn.get\"}".to_vec(),
            authenticator_data: vec![1],
            signature: vec![2],
            user_handle: Some(b"u_42".to_vec()),
        })
    }
}

struct StubChatBackend;

#[async_trait]
impl ChatBackend for StubChatBackend {
    async fn run_chat(
        &self,
        session_token: &str,
        request: &ChatRequest,
    ) -> Result<ChatReply, ApiError> {
        assert_eq!(session_token, "tok_abcdef");
        assert_eq!(request.user_id, "user@example.com");
        Ok(ChatReply {
            response: format!("echo: {}", request.message),
            conversation_id: Some("conv_1".to_string()),
            message_id: None,
            usage: None,
            request_id: None,
        })
    }
}

#[tokio::test]
async fn register_chat_and_sign_out_across_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("portal-state.json");

    // Surface one: register a passkey
    let store = SessionStore::new(Arc::new(FileStorage::new(&state_path)));
    assert!(matches!(
        store.require_auth(),
        AuthGuard::RedirectedToLogin(_)
    ));

    let client = PasskeyClient::new(
        StubBackend {
            sign_out_calls: AtomicUsize::new(0),
        },
        StubAuthenticator,
        store,
    );
    assert!(client.supports_passkeys());
    let session = client.register("user@example.com", "Sample User").await.unwrap();
    assert_eq!(session, sample_session());

    // Surface two: a separate store over the same state file sees the session
    let chat_store = SessionStore::new(Arc::new(FileStorage::new(&state_path)));
    assert!(chat_store.is_authenticated());
    assert_eq!(chat_store.require_auth(), AuthGuard::Authorized);

    let chat = ChatClient::new(StubChatBackend, chat_store.clone());
    let reply = chat.chat("hello", None).await.unwrap();
    assert_eq!(reply.response, "echo: hello");
    assert_eq!(chat_store.conversation_id(), Some("conv_1".to_string()));

    // Sign out from surface one; surface two loses the session too
    client.sign_out().await;
    assert!(!chat_store.is_authenticated());
    assert!(matches!(
        chat.chat("still there?", None).await.unwrap_err(),
        ApiError::NoSession
    ));
}

#[tokio::test]
async fn authentication_flow_commits_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(Arc::new(FileStorage::new(dir.path().join("state.json"))));

    let client = PasskeyClient::new(
        StubBackend {
            sign_out_calls: AtomicUsize::new(0),
        },
        StubAuthenticator,
        store,
    );
    let session = client.authenticate().await.unwrap();
    assert_eq!(session.user_id, "u_42");
    assert!(client.store().is_authenticated());
}
