//! Publisher configuration.

use agent_manifest_core::SignedBlocks;

/// Default environment variable holding the base64 signing key.
pub const DEFAULT_SIGNING_KEY_ENV: &str = "MANIFEST_SIGNING_KEY";

/// Default location of the published public key.
pub const DEFAULT_PUBLIC_KEY_HINT: &str = "/.well-known/manifest-key.pem";

/// Environment variable overriding [`PublisherConfig::signing_key_env`].
pub const ENV_SIGNING_KEY_ENV: &str = "MANIFEST_SIGNING_KEY_ENV";
/// Environment variable overriding [`PublisherConfig::public_key_hint`].
pub const ENV_PUBLIC_KEY_HINT: &str = "MANIFEST_PUBLIC_KEY_HINT";
/// Environment variable overriding [`PublisherConfig::scope`]; empty disables it.
pub const ENV_SCOPE: &str = "MANIFEST_SCOPE";
/// Environment variable restricting [`PublisherConfig::signed_blocks`],
/// comma-separated.
pub const ENV_SIGNED_BLOCKS: &str = "MANIFEST_SIGNED_BLOCKS";

/// Configuration for the [`Publisher`](crate::Publisher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Environment variable the signing key is read from.
    pub signing_key_env: String,
    /// Where consumers find the public key; published in `trust.public_key_hint`.
    pub public_key_hint: String,
    /// Published in `trust.scope` when set.
    pub scope: Option<String>,
    /// Which top-level fields the signature covers.
    pub signed_blocks: SignedBlocks,
    /// `Cache-Control` for the discovery document.
    pub cache_control: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            signing_key_env: DEFAULT_SIGNING_KEY_ENV.to_string(),
            public_key_hint: DEFAULT_PUBLIC_KEY_HINT.to_string(),
            scope: Some("full".to_string()),
            signed_blocks: SignedBlocks::All,
            cache_control: "public, max-age=3600".to_string(),
        }
    }
}

impl PublisherConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(var) = lookup(ENV_SIGNING_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            config.signing_key_env = var.trim().to_string();
        }
        if let Some(hint) = lookup(ENV_PUBLIC_KEY_HINT).filter(|v| !v.trim().is_empty()) {
            config.public_key_hint = hint.trim().to_string();
        }
        if let Some(scope) = lookup(ENV_SCOPE) {
            let scope = scope.trim();
            config.scope = (!scope.is_empty()).then(|| scope.to_string());
        }
        if let Some(blocks) = lookup(ENV_SIGNED_BLOCKS) {
            let names: Vec<String> = blocks
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                config.signed_blocks = SignedBlocks::Only(names);
            }
        }

        config
    }

    /// Override where consumers fetch the public key.
    pub fn with_public_key_hint(mut self, hint: impl Into<String>) -> Self {
        self.public_key_hint = hint.into();
        self
    }

    /// Override the scope label; `None` omits it.
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// Override which fields the signature covers.
    pub fn with_signed_blocks(mut self, blocks: SignedBlocks) -> Self {
        self.signed_blocks = blocks;
        self
    }
}
