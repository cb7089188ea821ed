//! Envelope verification.
//!
//! Verification reads `trust.signed_blocks`, rebuilds the sub-object of those
//! fields as they stand in the envelope now, canonicalizes it, and checks the
//! signature against a known public key. Fields outside `signed_blocks` are
//! not protected and may change freely.

use serde_json::Value;

use crate::crypto::{Ed25519Signature, PublicKey};
use crate::envelope::{SignedEnvelope, TrustLevel, ALGORITHM};
use crate::error::VerifyError;
use crate::signer::signing_payload;

/// Checks envelopes against one trusted public key.
#[derive(Debug, Clone, Copy)]
pub struct ManifestVerifier {
    public_key: PublicKey,
}

impl ManifestVerifier {
    /// Verify against `public_key`.
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    /// Build a verifier from the published PEM document.
    pub fn from_pem(pem: &str) -> Result<Self, crate::error::PublicKeyError> {
        Ok(Self::new(PublicKey::from_pem(pem)?))
    }

    /// The key signatures are checked against.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Verify a parsed envelope.
    pub fn verify(&self, envelope: &SignedEnvelope) -> Result<(), VerifyError> {
        let trust = &envelope.trust;

        if trust.algorithm != ALGORITHM {
            return Err(VerifyError::MalformedEnvelope(format!(
                "unsupported algorithm {:?}",
                trust.algorithm
            )));
        }

        let signature = match (trust.trust_level, &envelope.signature) {
            (TrustLevel::Unsigned, None) => return Err(VerifyError::Unsigned),
            (TrustLevel::Unsigned, Some(_)) => {
                return Err(VerifyError::MalformedEnvelope(
                    "unsigned envelope carries a signature".into(),
                ))
            }
            (TrustLevel::SelfSigned, None) => {
                return Err(VerifyError::MalformedEnvelope(
                    "self-signed envelope has no signature".into(),
                ))
            }
            (TrustLevel::SelfSigned, Some(sig)) => sig,
        };

        if trust.signed_blocks.is_empty() {
            return Err(VerifyError::MalformedEnvelope("signed_blocks is empty".into()));
        }

        let payload = signing_payload(&envelope.manifest, &trust.signed_blocks)?;
        let signature = Ed25519Signature::from_base64(&signature.value)?;

        self.public_key.verify(&payload, &signature)
    }

    /// Verify a published JSON value.
    pub fn verify_value(&self, value: &Value) -> Result<(), VerifyError> {
        let envelope = SignedEnvelope::from_value(value.clone())?;
        self.verify(&envelope)
    }

    /// Verify published JSON text.
    pub fn verify_json(&self, text: &str) -> Result<(), VerifyError> {
        let envelope = SignedEnvelope::from_json(text)?;
        self.verify(&envelope)
    }

    /// `true` only for a fully valid signature.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.verify_value(value).is_ok()
    }
}
