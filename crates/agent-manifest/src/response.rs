//! Framework-agnostic HTTP documents served by the publishing endpoints.

use agent_manifest_core::PublicKey;

use crate::error::Result;

/// Content type of the discovery document.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of the public key document.
pub const PEM_CONTENT_TYPE: &str = "application/x-pem-file";

/// Cache policy for the public key; it only changes on rotation.
pub const PUBLIC_KEY_CACHE_CONTROL: &str = "public, max-age=86400";

/// A document ready to hand to whatever serves HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub cache_control: String,
    pub body: String,
}

impl DocumentResponse {
    /// A 200 response.
    pub fn ok(content_type: &'static str, cache_control: impl Into<String>, body: String) -> Self {
        Self {
            status: 200,
            content_type,
            cache_control: cache_control.into(),
            body,
        }
    }
}

/// The PEM document published at the well-known public key location.
pub fn public_key_document(key: &PublicKey) -> Result<DocumentResponse> {
    Ok(DocumentResponse::ok(
        PEM_CONTENT_TYPE,
        PUBLIC_KEY_CACHE_CONTROL,
        key.to_pem()?,
    ))
}
