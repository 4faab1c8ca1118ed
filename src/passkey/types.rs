//! Passkey handshake data types
//!
//! Two shapes per structure: the wire form, where binary fields are URL-safe
//! unpadded base64 strings inside camelCase JSON, and the decoded form handed
//! to the platform authenticator, where the same fields are raw bytes.
//! Options decode on the way in; credentials re-encode on the way out.

use serde::{Deserialize, Serialize};

use crate::passkey::PasskeyError;
use crate::utils::encoding::{from_base64url, to_base64url};

// ---------------------------------------------------------------------------
// Server-issued challenge options (wire form)
// ---------------------------------------------------------------------------

/// Registration options as issued by the options endpoint
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub challenge: String, // Base64URL-encoded challenge bytes
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    #[serde(default)]
    pub timeout: Option<u32>, // Milliseconds
    #[serde(default)]
    pub attestation: Option<String>, // "none", "indirect", "direct"
    #[serde(default)]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

/// Authentication options as issued by the options endpoint
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub challenge: String, // Base64URL-encoded challenge bytes
    pub rp_id: String,
    #[serde(default)]
    pub timeout: Option<u32>, // Milliseconds
    #[serde(default)]
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,
    #[serde(default)]
    pub user_verification: Option<String>, // "required", "preferred", "discouraged"
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RelyingParty {
    pub id: String,   // Domain scope the credential is bound to
    pub name: String, // Display name
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: String, // Base64URL-encoded user handle
    pub name: String,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PublicKeyCredentialParameters {
    pub r#type: String, // Always "public-key"
    pub alg: i32,       // COSE algorithm identifier (-7 ES256, -257 RS256)
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    #[serde(default)]
    pub authenticator_attachment: Option<String>, // "platform", "cross-platform"
    #[serde(default)]
    pub require_resident_key: Option<bool>,
    #[serde(default)]
    pub user_verification: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CredentialDescriptor {
    pub r#type: String, // Always "public-key"
    pub id: String,     // Base64URL-encoded credential ID
    #[serde(default)]
    pub transports: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Decoded forms handed to the platform authenticator
// ---------------------------------------------------------------------------

/// Decoded `navigator.credentials.create` options
#[derive(Clone, Debug)]
pub struct CredentialCreationRequest {
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user_handle: Vec<u8>,
    pub user_name: String,
    pub user_display_name: String,
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    pub timeout: Option<u32>,
    pub attestation: Option<String>,
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

/// Decoded `navigator.credentials.get` options
#[derive(Clone, Debug)]
pub struct CredentialAssertionRequest {
    pub challenge: Vec<u8>,
    pub rp_id: String,
    pub allow_credentials: Vec<AllowedCredential>,
    pub timeout: Option<u32>,
    pub user_verification: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AllowedCredential {
    pub id: Vec<u8>,
    pub transports: Vec<String>,
}

impl RegistrationOptions {
    /// Decode wire-form binary fields into platform-ready raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Encoding`] if the challenge or user handle is
    /// not valid base64url
    pub fn decode(&self) -> Result<CredentialCreationRequest, PasskeyError> {
        Ok(CredentialCreationRequest {
            challenge: from_base64url(&self.challenge)?,
            rp: self.rp.clone(),
            user_handle: from_base64url(&self.user.id)?,
            user_name: self.user.name.clone(),
            user_display_name: self.user.display_name.clone(),
            pub_key_cred_params: self.pub_key_cred_params.clone(),
            timeout: self.timeout,
            attestation: self.attestation.clone(),
            authenticator_selection: self.authenticator_selection.clone(),
        })
    }
}

impl AuthenticationOptions {
    /// Decode wire-form binary fields into platform-ready raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyError::Encoding`] if the challenge or an allowed
    /// credential id is not valid base64url
    pub fn decode(&self) -> Result<CredentialAssertionRequest, PasskeyError> {
        let mut allow_credentials = Vec::new();
        for descriptor in self.allow_credentials.iter().flatten() {
            allow_credentials.push(AllowedCredential {
                id: from_base64url(&descriptor.id)?,
                transports: descriptor.transports.clone().unwrap_or_default(),
            });
        }
        Ok(CredentialAssertionRequest {
            challenge: from_base64url(&self.challenge)?,
            rp_id: self.rp_id.clone(),
            allow_credentials,
            timeout: self.timeout,
            user_verification: self.user_verification.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Authenticator outputs (raw bytes)
// ---------------------------------------------------------------------------

/// Newly created credential, as produced by the platform authenticator
#[derive(Clone, Debug)]
pub struct CreatedCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
}

/// Assertion over a server challenge, as produced by the authenticator
#[derive(Clone, Debug)]
pub struct CredentialAssertion {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Verify-request payloads (wire form)
// ---------------------------------------------------------------------------

/// Identity hints sent to the registration options endpoint
#[derive(Serialize, Clone, Debug)]
pub struct RegistrationOptionsRequest {
    pub email: String,
    pub name: String,
}

/// Body POSTed to the registration verify endpoint
#[derive(Serialize, Debug)]
pub struct RegistrationVerifyRequest {
    pub email: String,
    pub credential: WireRegistrationCredential,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireRegistrationCredential {
    pub id: String,
    pub raw_id: String, // Base64URL re-encoded
    pub r#type: String, // Always "public-key"
    pub response: WireAttestationResponse,
}

#[derive(Serialize, Debug)]
pub struct WireAttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String, // Base64URL re-encoded
    #[serde(rename = "attestationObject")]
    pub attestation_object: String, // Base64URL re-encoded
}

/// Body POSTed to the authentication verify endpoint
#[derive(Serialize, Debug)]
pub struct AuthenticationVerifyRequest {
    pub credential: WireAssertionCredential,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireAssertionCredential {
    pub id: String,
    pub raw_id: String, // Base64URL re-encoded
    pub r#type: String, // Always "public-key"
    pub response: WireAssertionResponse,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireAssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String, // Base64URL re-encoded
    pub authenticator_data: String, // Base64URL re-encoded
    pub signature: String,          // Base64URL re-encoded
    pub user_handle: Option<String>, // Base64URL re-encoded, absent when not provided
}

impl RegistrationVerifyRequest {
    #[must_use]
    pub fn new(email: &str, credential: &CreatedCredential) -> Self {
        Self {
            email: email.to_string(),
            credential: WireRegistrationCredential {
                id: credential.id.clone(),
                raw_id: to_base64url(&credential.raw_id),
                r#type: "public-key".to_string(),
                response: WireAttestationResponse {
                    client_data_json: to_base64url(&credential.client_data_json),
                    attestation_object: to_base64url(&credential.attestation_object),
                },
            },
        }
    }
}

impl AuthenticationVerifyRequest {
    #[must_use]
    pub fn new(assertion: &CredentialAssertion) -> Self {
        Self {
            credential: WireAssertionCredential {
                id: assertion.id.clone(),
                raw_id: to_base64url(&assertion.raw_id),
                r#type: "public-key".to_string(),
                response: WireAssertionResponse {
                    client_data_json: to_base64url(&assertion.client_data_json),
                    authenticator_data: to_base64url(&assertion.authenticator_data),
                    signature: to_base64url(&assertion.signature),
                    user_handle: assertion.user_handle.as_deref().map(to_base64url),
                },
            },
        }
    }
}
