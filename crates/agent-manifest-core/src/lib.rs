//! # Agent Manifest Core
//!
//! Pure primitives for publishing signed capability manifests: canonical JSON,
//! Ed25519 key loading, signing and verification.
//!
//! This crate contains no I/O. Every operation is a request-scoped
//! computation over values the caller supplies.
//!
//! ## Key Types
//!
//! - [`Manifest`] - The JSON object being published
//! - [`KeyMaterial`] / [`ManifestKey`] - Private key decoding and the signing handle
//! - [`ManifestSigner`] - Produces detached signatures and sealed envelopes
//! - [`ManifestVerifier`] - Checks a published envelope against a public key
//! - [`SignedEnvelope`] - The manifest plus its `trust` and `signature` blocks
//!
//! ## Canonicalization
//!
//! Signatures cover canonical JSON: keys sorted by code point at every level,
//! arrays in order, no whitespace. See [`canonical`] module.
//!
//! ```rust
//! use agent_manifest_core::{
//!     KeyMaterial, Manifest, ManifestKey, ManifestSigner, ManifestVerifier, SignedBlocks,
//! };
//! use serde_json::json;
//!
//! let key = ManifestKey::import(&KeyMaterial::RawSeed([7; 32])).unwrap();
//! let signer = ManifestSigner::new(key);
//! let manifest = Manifest::from_value(json!({"feed_type": "mcp"})).unwrap();
//!
//! let envelope = signer
//!     .seal(manifest, &SignedBlocks::All, "/.well-known/manifest-key.pem", None, chrono::Utc::now())
//!     .unwrap();
//!
//! let verifier = ManifestVerifier::new(signer.public_key());
//! assert!(verifier.is_valid(&envelope.to_value()));
//! ```

pub mod canonical;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod manifest;
pub mod signer;
pub mod verify;

pub use canonical::{canonical_bytes, canonical_bytes_of, canonical_string, to_json_value};
pub use crypto::{Ed25519Signature, KeyMaterial, ManifestKey, PublicKey};
pub use envelope::{SignatureBlock, SignedEnvelope, TrustBlock, TrustLevel, ALGORITHM};
pub use error::{
    CanonicalError, FailureReason, KeyFormatError, ManifestError, PublicKeyError, SignError,
    VerifyError,
};
pub use manifest::Manifest;
pub use signer::{signing_payload, DetachedSignature, ManifestSigner, SignedBlocks};
pub use verify::ManifestVerifier;
