//! # Agent Manifest
//!
//! Publishes signed agent discovery manifests.
//!
//! The [`Publisher`] fetches the signing key from a [`SecretSource`] on every
//! request, signs the manifest's blocks, and attaches `trust` and `signature`
//! blocks. A missing or broken key never takes the endpoint down: the
//! manifest is served unsigned with `trust_level = "unsigned"` and the
//! degrade is logged.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agent_manifest::{discovery_manifest, DiscoveryProfile, Publisher};
//!
//! # async fn example() -> agent_manifest::Result<()> {
//! let publisher = Publisher::from_env();
//! let manifest = discovery_manifest(&DiscoveryProfile::default())?;
//!
//! let response = publisher.respond(manifest).await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```
//!
//! Consumers verify with [`ManifestVerifier`] and the PEM served by
//! [`public_key_document`].

pub mod config;
pub mod discovery;
pub mod error;
pub mod publisher;
pub mod response;
pub mod secret;

pub use config::PublisherConfig;
pub use discovery::{discovery_manifest, DiscoveryProfile, ToolDescriptor};
pub use error::{PublishError, Result, SecretError};
pub use publisher::{Publication, PublishOutcome, Publisher, PublisherStats, StatsSnapshot};
pub use response::{public_key_document, DocumentResponse};
pub use secret::{EnvSecretSource, FileSecretSource, Secret, SecretSource, StaticSecretSource};

pub use agent_manifest_core::{
    canonical_bytes, canonical_string, signing_payload, Ed25519Signature, FailureReason,
    KeyMaterial, Manifest, ManifestError, ManifestKey, ManifestSigner, ManifestVerifier,
    PublicKey, SignError, SignedBlocks, SignedEnvelope, TrustBlock, TrustLevel, VerifyError,
};
