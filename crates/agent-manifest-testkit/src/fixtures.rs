//! Test fixtures and helpers.

use agent_manifest_core::{
    KeyMaterial, Manifest, ManifestKey, ManifestSigner, ManifestVerifier, PublicKey,
    SignedBlocks, SignedEnvelope,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

/// Public key hint used by fixtures.
pub const TEST_KEY_HINT: &str = "/.well-known/manifest-key.pem";

/// A signer with a known seed and the matching verifier.
pub struct TestSigner {
    pub seed: [u8; 32],
    pub signer: ManifestSigner,
}

impl TestSigner {
    /// Create with a random seed.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create with a deterministic seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let key = ManifestKey::import(&KeyMaterial::RawSeed(seed))
            .expect("every 32-byte seed imports");
        Self {
            seed,
            signer: ManifestSigner::new(key),
        }
    }

    /// Public half of the fixture key.
    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    /// A verifier for this fixture's signatures.
    pub fn verifier(&self) -> ManifestVerifier {
        ManifestVerifier::new(self.public_key())
    }

    /// The seed as a base64 raw-seed secret.
    pub fn seed_base64(&self) -> String {
        KeyMaterial::RawSeed(self.seed).to_base64()
    }

    /// The seed as a base64 PKCS#8 secret.
    pub fn pkcs8_base64(&self) -> String {
        KeyMaterial::Pkcs8(KeyMaterial::RawSeed(self.seed).to_pkcs8_der()).to_base64()
    }

    /// Seal `manifest` over the given blocks at a fixed time.
    pub fn seal(&self, manifest: Manifest, blocks: &SignedBlocks) -> SignedEnvelope {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 14, 12, 0, 0)
            .single()
            .expect("fixed timestamp is unambiguous");
        self.signer
            .seal(manifest, blocks, TEST_KEY_HINT, Some("full".to_string()), at)
            .expect("fixture manifest signs")
    }

    /// Seal over every block.
    pub fn seal_all(&self, manifest: Manifest) -> SignedEnvelope {
        self.seal(manifest, &SignedBlocks::All)
    }
}

impl Default for TestSigner {
    fn default() -> Self {
        Self::new()
    }
}

/// A small manifest shaped like a discovery document.
pub fn sample_manifest() -> Manifest {
    Manifest::from_value(json!({
        "feed_type": "mcp",
        "version": "1.0",
        "metadata": {"title": "Portfolio", "author": "Site owner"},
        "capabilities": {
            "mcp_endpoint": "/api/mcp",
            "tools": [{"name": "get_projects", "description": "List portfolio projects"}]
        }
    }))
    .expect("sample manifest is an object")
}
