//! The Publisher: signs discovery manifests per request.
//!
//! Publishing never fails outright. When the key is missing or unusable the
//! manifest goes out with `trust_level = "unsigned"`, its content unchanged,
//! and the degrade is logged and counted.

use std::sync::atomic::{AtomicU64, Ordering};

use agent_manifest_core::{
    DetachedSignature, Manifest, ManifestSigner, SignatureBlock, SignedEnvelope, TrustBlock,
};
use chrono::{DateTime, Utc};

use crate::config::PublisherConfig;
use crate::error::{PublishError, Result};
use crate::response::{DocumentResponse, JSON_CONTENT_TYPE};
use crate::secret::{EnvSecretSource, SecretSource};

/// How a publication came out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Signed with the configured key.
    Signed,
    /// No key configured; published unsigned with a `note`.
    NoKey,
    /// Key present but unusable; published unsigned with an `error`.
    Degraded(String),
}

/// A published document and how it was produced.
#[derive(Debug, Clone)]
pub struct Publication {
    pub envelope: SignedEnvelope,
    pub outcome: PublishOutcome,
}

impl Publication {
    /// Whether the document carries a signature.
    pub fn is_signed(&self) -> bool {
        self.outcome == PublishOutcome::Signed
    }

    /// Render as an HTTP document. Degraded publications are still 200.
    pub fn to_response(&self, cache_control: &str) -> Result<DocumentResponse> {
        Ok(DocumentResponse::ok(
            JSON_CONTENT_TYPE,
            cache_control,
            self.envelope.to_json_pretty()?,
        ))
    }
}

/// Counters for publication outcomes.
#[derive(Debug, Default)]
pub struct PublisherStats {
    signed: AtomicU64,
    unsigned_no_key: AtomicU64,
    unsigned_error: AtomicU64,
}

/// Point-in-time copy of [`PublisherStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub signed: u64,
    pub unsigned_no_key: u64,
    pub unsigned_error: u64,
}

impl PublisherStats {
    /// Current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            signed: self.signed.load(Ordering::Relaxed),
            unsigned_no_key: self.unsigned_no_key.load(Ordering::Relaxed),
            unsigned_error: self.unsigned_error.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &PublishOutcome) {
        let counter = match outcome {
            PublishOutcome::Signed => &self.signed,
            PublishOutcome::NoKey => &self.unsigned_no_key,
            PublishOutcome::Degraded(_) => &self.unsigned_error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Publishes manifests signed with a key fetched from `S` on every call.
pub struct Publisher<S: SecretSource> {
    secrets: S,
    config: PublisherConfig,
    stats: PublisherStats,
}

impl Publisher<EnvSecretSource> {
    /// Publisher configured from the process environment.
    pub fn from_env() -> Self {
        let config = PublisherConfig::from_env();
        let secrets = EnvSecretSource::new(config.signing_key_env.clone());
        Self::new(secrets, config)
    }
}

impl<S: SecretSource> Publisher<S> {
    /// Publisher reading keys from `secrets`.
    pub fn new(secrets: S, config: PublisherConfig) -> Self {
        Self {
            secrets,
            config,
            stats: PublisherStats::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Outcome counters since construction.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Sign `manifest`, or fail.
    pub async fn try_publish(&self, manifest: Manifest) -> Result<SignedEnvelope> {
        let detached = self.sign_detached(&manifest).await?;
        Ok(self.signed_envelope(manifest, detached, Utc::now()))
    }

    /// Sign `manifest`, falling back to an unsigned document on any failure.
    pub async fn publish(&self, manifest: Manifest) -> Publication {
        self.publish_at(manifest, Utc::now()).await
    }

    /// [`publish`](Self::publish) with an explicit signing time.
    pub async fn publish_at(&self, manifest: Manifest, now: DateTime<Utc>) -> Publication {
        let publication = match self.sign_detached(&manifest).await {
            Ok(detached) => Publication {
                envelope: self.signed_envelope(manifest, detached, now),
                outcome: PublishOutcome::Signed,
            },
            Err(PublishError::NoSigningKey) => {
                tracing::warn!(
                    source = %self.secrets.describe(),
                    reason = "no_signing_key",
                    "publishing unsigned manifest"
                );
                let trust = self.unsigned_trust(&manifest).with_note("signing key not configured");
                Publication {
                    envelope: SignedEnvelope::unsigned(manifest, trust),
                    outcome: PublishOutcome::NoKey,
                }
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.secrets.describe(),
                    reason = "signing_failed",
                    error = %e,
                    "publishing unsigned manifest"
                );
                let message = e.public_message();
                let trust = self.unsigned_trust(&manifest).with_error(message.clone());
                Publication {
                    envelope: SignedEnvelope::unsigned(manifest, trust),
                    outcome: PublishOutcome::Degraded(message),
                }
            }
        };

        self.stats.record(&publication.outcome);
        publication
    }

    /// Publish and render as an HTTP document.
    ///
    /// Only a rendering failure surfaces here; signing failures have already
    /// been folded into an unsigned document.
    pub async fn respond(&self, manifest: Manifest) -> Result<DocumentResponse> {
        self.publish(manifest)
            .await
            .to_response(&self.config.cache_control)
    }

    /// Fetch the key, sign, and let the key go out of scope.
    async fn sign_detached(&self, manifest: &Manifest) -> Result<DetachedSignature> {
        let secret = self
            .secrets
            .signing_key()
            .await?
            .ok_or(PublishError::NoSigningKey)?;
        let signer = ManifestSigner::from_base64(secret.expose())?;
        drop(secret);

        Ok(signer.sign(manifest, &self.config.signed_blocks)?)
    }

    fn signed_envelope(
        &self,
        manifest: Manifest,
        detached: DetachedSignature,
        now: DateTime<Utc>,
    ) -> SignedEnvelope {
        let trust = TrustBlock::self_signed(detached.signed_blocks, &self.config.public_key_hint)
            .with_scope(self.config.scope.clone());
        SignedEnvelope {
            manifest,
            trust,
            signature: Some(SignatureBlock::new(detached.value, now)),
        }
    }

    /// Trust block for a fallback document, listing the blocks a signature
    /// would have covered.
    fn unsigned_trust(&self, manifest: &Manifest) -> TrustBlock {
        let blocks = self
            .config
            .signed_blocks
            .resolve(manifest)
            .unwrap_or_default();
        TrustBlock::unsigned(blocks, &self.config.public_key_hint)
            .with_scope(self.config.scope.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::StaticSecretSource;
    use agent_manifest_core::{KeyMaterial, ManifestKey, ManifestVerifier, TrustLevel};
    use serde_json::json;
    use std::sync::Arc;

    fn manifest() -> Manifest {
        Manifest::from_value(json!({"feed_type": "mcp", "metadata": {"title": "X"}})).unwrap()
    }

    #[tokio::test]
    async fn test_publish_signed() {
        let secret = KeyMaterial::RawSeed([0x42; 32]).to_base64();
        let publisher = Publisher::new(StaticSecretSource::new(secret), PublisherConfig::default());

        let publication = publisher.publish(manifest()).await;
        assert!(publication.is_signed());
        assert_eq!(publication.envelope.trust_level(), TrustLevel::SelfSigned);
        assert_eq!(publication.envelope.trust.scope.as_deref(), Some("full"));
        assert_eq!(publisher.stats().signed, 1);
    }

    #[tokio::test]
    async fn test_publish_without_key() {
        let publisher = Publisher::new(StaticSecretSource::empty(), PublisherConfig::default());

        let publication = publisher.publish(manifest()).await;
        assert_eq!(publication.outcome, PublishOutcome::NoKey);
        assert!(publication.envelope.signature.is_none());
        assert_eq!(
            publication.envelope.trust.note.as_deref(),
            Some("signing key not configured")
        );
        assert_eq!(publication.envelope.manifest, manifest());
        assert_eq!(publisher.stats().unsigned_no_key, 1);
    }

    #[tokio::test]
    async fn test_try_publish_propagates() {
        let publisher = Publisher::new(StaticSecretSource::empty(), PublisherConfig::default());
        assert!(matches!(
            publisher.try_publish(manifest()).await,
            Err(PublishError::NoSigningKey)
        ));
    }

    #[tokio::test]
    async fn test_publish_with_bad_key() {
        // Decodes as base64 but is 16 bytes long.
        let publisher = Publisher::new(
            StaticSecretSource::new("AAAAAAAAAAAAAAAAAAAAAA=="),
            PublisherConfig::default(),
        );

        let publication = publisher.publish(manifest()).await;
        match &publication.outcome {
            PublishOutcome::Degraded(message) => assert!(message.contains("got 16 bytes")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(publication.envelope.trust_level(), TrustLevel::Unsigned);
        assert_eq!(
            publication.envelope.trust.signed_blocks,
            vec!["feed_type", "metadata"]
        );
        assert!(publication.envelope.trust.error.is_some());
        assert_eq!(publisher.stats().unsigned_error, 1);
    }

    #[tokio::test]
    async fn test_concurrent_publishes() {
        let material = KeyMaterial::RawSeed([0x42; 32]);
        let public_key = ManifestKey::import(&material).unwrap().public_key();
        let secret = material.to_base64();
        let publisher = Arc::new(Publisher::new(
            StaticSecretSource::new(secret),
            PublisherConfig::default(),
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let publisher = Arc::clone(&publisher);
            handles.push(tokio::spawn(async move {
                let mut m = manifest();
                m.insert("request", json!(i)).unwrap();
                publisher.publish(m).await
            }));
        }

        let verifier = ManifestVerifier::new(public_key);
        for handle in handles {
            let publication = handle.await.unwrap();
            assert!(publication.is_signed());
            verifier.verify(&publication.envelope).unwrap();
        }
        assert_eq!(publisher.stats().signed, 8);
    }

    #[tokio::test]
    async fn test_response_rendering() {
        let publisher = Publisher::new(StaticSecretSource::empty(), PublisherConfig::default());
        let response = publisher.respond(manifest()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(response.cache_control, "public, max-age=3600");
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["trust"]["trust_level"], "unsigned");
        assert_eq!(body["feed_type"], "mcp");
    }

    #[tokio::test]
    async fn test_stats_accumulate() {
        let secret = KeyMaterial::RawSeed([0x01; 32]).to_base64();
        let signed = Publisher::new(StaticSecretSource::new(secret), PublisherConfig::default());
        for _ in 0..3 {
            signed.publish(manifest()).await;
        }
        assert_eq!(
            signed.stats(),
            StatsSnapshot {
                signed: 3,
                unsigned_no_key: 0,
                unsigned_error: 0
            }
        );
    }
}
