//! Error types for manifest canonicalization, signing and verification.

use thiserror::Error;

/// Errors produced while computing the canonical form of a JSON value.
///
/// These indicate a programming error in whoever built the value; a manifest
/// assembled from well-formed static data never produces one.
#[derive(Debug, Error)]
pub enum CanonicalError {
    #[error("value nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("value cannot be represented as JSON: {0}")]
    Unrepresentable(String),

    #[error("string encoding failed: {0}")]
    Encoding(String),
}

/// Errors constructing a [`Manifest`](crate::manifest::Manifest).
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("manifest uses reserved top-level field {0:?}")]
    ReservedField(String),

    #[error("manifest field {0:?} is not present")]
    MissingField(String),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

/// Errors decoding private key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyFormatError {
    /// The decoder's message is dropped: it can quote bytes of the secret.
    #[error("signing key is not valid base64")]
    Base64,

    #[error("invalid key length: got {got} bytes, expected 32 (raw seed) or 48 (PKCS#8)")]
    InvalidLength { got: usize },
}

/// Errors parsing a published public key.
#[derive(Debug, Error)]
pub enum PublicKeyError {
    #[error("invalid PEM public key: {0}")]
    Pem(String),

    #[error("invalid DER public key: {0}")]
    Der(String),

    #[error("invalid hex public key: {0}")]
    Hex(String),

    #[error("public key must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("public key is not a valid Ed25519 point")]
    InvalidPoint,
}

/// Errors on the signing path.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("key format error: {0}")]
    KeyFormat(#[from] KeyFormatError),

    #[error("signing key could not be imported: {0}")]
    KeyImport(String),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("no signed blocks: refusing to sign an empty payload")]
    NoSignedBlocks,
}

impl From<CanonicalError> for SignError {
    fn from(e: CanonicalError) -> Self {
        SignError::Manifest(ManifestError::Canonical(e))
    }
}

/// Coarse classification of a verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    SignatureMismatch,
    MissingSignedField,
    MalformedEnvelope,
}

/// Errors on the verification path.
///
/// Any of these means the envelope must be treated as untrusted in full.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("missing signed field {0:?}")]
    MissingSignedField(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("envelope is unsigned")]
    Unsigned,
}

impl VerifyError {
    /// Classify this failure.
    ///
    /// An unsigned envelope counts as malformed: it carries nothing to check.
    pub fn reason(&self) -> FailureReason {
        match self {
            VerifyError::SignatureMismatch => FailureReason::SignatureMismatch,
            VerifyError::MissingSignedField(_) => FailureReason::MissingSignedField,
            VerifyError::MalformedEnvelope(_) | VerifyError::Unsigned => {
                FailureReason::MalformedEnvelope
            }
        }
    }
}

impl From<CanonicalError> for VerifyError {
    fn from(e: CanonicalError) -> Self {
        VerifyError::MalformedEnvelope(e.to_string())
    }
}

impl From<ManifestError> for VerifyError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::MissingField(name) => VerifyError::MissingSignedField(name),
            other => VerifyError::MalformedEnvelope(other.to_string()),
        }
    }
}
