//! Manifest signing.
//!
//! The signature covers the canonical form of the sub-object made of the
//! signed blocks only. The envelope fields (`trust`, `signature`) do not
//! exist yet when the signature is computed and are never covered.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::canonical::canonical_bytes;
use crate::crypto::{Ed25519Signature, ManifestKey, PublicKey};
use crate::envelope::{SignatureBlock, SignedEnvelope, TrustBlock, ALGORITHM};
use crate::error::{ManifestError, SignError};
use crate::manifest::Manifest;

/// Which top-level fields a signature covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignedBlocks {
    /// Every top-level field present at signing time, in manifest order.
    #[default]
    All,
    /// The named fields. Duplicates collapse to their first occurrence.
    Only(Vec<String>),
}

impl SignedBlocks {
    /// Resolve to a concrete list of field names for `manifest`.
    pub fn resolve(&self, manifest: &Manifest) -> Result<Vec<String>, SignError> {
        let names: Vec<String> = match self {
            SignedBlocks::All => manifest.keys().map(str::to_string).collect(),
            SignedBlocks::Only(names) => {
                let mut unique: Vec<String> = Vec::with_capacity(names.len());
                for name in names {
                    if !unique.contains(name) {
                        unique.push(name.clone());
                    }
                }
                unique
            }
        };

        if names.is_empty() {
            return Err(SignError::NoSignedBlocks);
        }
        if let Some(missing) = names.iter().find(|n| manifest.get(n).is_none()) {
            return Err(ManifestError::MissingField(missing.clone()).into());
        }
        Ok(names)
    }
}

/// A signature detached from its envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedSignature {
    /// Base64 of the raw signature bytes.
    pub value: String,
    pub signed_blocks: Vec<String>,
    pub algorithm: &'static str,
}

/// Compute the bytes a signature over `blocks` of `manifest` covers.
pub fn signing_payload<S: AsRef<str>>(
    manifest: &Manifest,
    blocks: &[S],
) -> Result<Vec<u8>, ManifestError> {
    let selected = manifest.select(blocks)?;
    Ok(canonical_bytes(&Value::Object(selected))?)
}

/// Signs manifests with one key.
#[derive(Debug)]
pub struct ManifestSigner {
    key: ManifestKey,
}

impl ManifestSigner {
    /// Sign with `key`.
    pub fn new(key: ManifestKey) -> Self {
        Self { key }
    }

    /// Decode a base64 secret and build a signer from it.
    pub fn from_base64(secret: &str) -> Result<Self, SignError> {
        Ok(Self::new(ManifestKey::from_base64(secret)?))
    }

    /// Public half of the signing key.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Sign the chosen blocks of a manifest.
    ///
    /// The manifest is not modified. Ed25519 is deterministic: the same
    /// blocks with the same content always give the same signature.
    pub fn sign(
        &self,
        manifest: &Manifest,
        blocks: &SignedBlocks,
    ) -> Result<DetachedSignature, SignError> {
        let signed_blocks = blocks.resolve(manifest)?;
        let payload = signing_payload(manifest, &signed_blocks)?;
        let signature: Ed25519Signature = self.key.sign(&payload);

        tracing::debug!(
            blocks = signed_blocks.len(),
            payload_len = payload.len(),
            key = %self.public_key().fingerprint(),
            "signed manifest"
        );

        Ok(DetachedSignature {
            value: signature.to_base64(),
            signed_blocks,
            algorithm: ALGORITHM,
        })
    }

    /// Sign and wrap into a publishable envelope.
    pub fn seal(
        &self,
        manifest: Manifest,
        blocks: &SignedBlocks,
        public_key_hint: &str,
        scope: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<SignedEnvelope, SignError> {
        let detached = self.sign(&manifest, blocks)?;
        let trust =
            TrustBlock::self_signed(detached.signed_blocks, public_key_hint).with_scope(scope);
        Ok(SignedEnvelope {
            manifest,
            trust,
            signature: Some(SignatureBlock::new(detached.value, created_at)),
        })
    }
}
