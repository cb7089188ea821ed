//! Error types for manifest publishing.

use std::path::PathBuf;

use agent_manifest_core::{ManifestError, PublicKeyError, SignError};
use thiserror::Error;

/// Errors fetching the signing secret.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The environment variable exists but is not valid unicode.
    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(String),

    /// The secret file could not be read.
    #[error("failed to read secret file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while publishing a manifest.
#[derive(Debug, Error)]
pub enum PublishError {
    /// No signing key is configured.
    #[error("signing key not configured")]
    NoSigningKey,

    /// The secret source failed.
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),

    /// Key decoding, key import, or signing failed.
    #[error("signing error: {0}")]
    Sign(#[from] SignError),

    /// The manifest itself is unusable.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// The public key could not be rendered.
    #[error("public key error: {0}")]
    PublicKey(#[from] PublicKeyError),

    /// A document could not be rendered to JSON.
    #[error("render error: {0}")]
    Render(#[from] serde_json::Error),
}

impl PublishError {
    /// Message safe to place in a published document.
    ///
    /// Secret-source failures can name files or variables on the host, so
    /// consumers only learn that the key was unavailable.
    pub fn public_message(&self) -> String {
        match self {
            PublishError::Secret(_) => "signing key unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for publishing operations.
pub type Result<T> = std::result::Result<T, PublishError>;
