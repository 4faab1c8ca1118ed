//! Base64URL helpers for `WebAuthn` binary fields
//!
//! Challenges, user handles, credential ids and authenticator outputs travel
//! as URL-safe unpadded base64 text on the wire and as raw bytes across the
//! platform authenticator boundary. These helpers convert between the two.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Encode raw bytes to URL-safe unpadded base64 text
#[must_use]
pub fn to_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe unpadded base64 text to raw bytes
///
/// # Errors
///
/// Returns an error if the input is not valid base64url
pub fn from_base64url(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(text)
}
