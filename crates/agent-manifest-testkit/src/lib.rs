//! # Agent Manifest Testkit
//!
//! Testing utilities for agent manifest signing.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known keys, canonical forms and signatures for cross-implementation checks
//! - **Generators**: Proptest strategies for manifests and keys
//! - **Fixtures**: A deterministic signer with its verifier
//!
//! ## Golden Vectors
//!
//! ```rust
//! use agent_manifest_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().expect("this build reproduces every vector");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use agent_manifest_testkit::generators::manifest_with_reordered_copy;
//!
//! proptest! {
//!     #[test]
//!     fn key_order_does_not_matter((a, b) in manifest_with_reordered_copy()) {
//!         prop_assert_eq!(canonical_bytes(&a.into()), canonical_bytes(&b.into()));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use agent_manifest_testkit::fixtures::{sample_manifest, TestSigner};
//!
//! let fixture = TestSigner::with_seed([1; 32]);
//! let envelope = fixture.seal_all(sample_manifest());
//! assert!(fixture.verifier().verify(&envelope).is_ok());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_manifest, TestSigner};
pub use generators::{json_value, manifest, manifest_with_reordered_copy};
pub use vectors::{key_vectors, signature_vectors, verify_all_vectors, KeyVector, SignatureVector};
