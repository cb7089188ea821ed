//! Sources for the base64 signing secret.
//!
//! The secret is fetched once per publish call and dropped when the call
//! returns. Nothing here caches it.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::SecretError;

/// A secret string. `Debug` never prints the contents, and the buffer is
/// wiped when the last copy drops.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the secret value.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Blank values count as "not configured".
    fn non_blank(value: String) -> Option<Self> {
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(value)))
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted>)")
    }
}

/// Where the signing key comes from.
///
/// `Ok(None)` means no key is configured, which the publisher answers with
/// an unsigned document. `Err` means a key may exist but could not be read.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch the base64 signing key.
    async fn signing_key(&self) -> Result<Option<Secret>, SecretError>;

    /// Short description for logs. Must not include the secret.
    fn describe(&self) -> String;
}

/// Reads the key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecretSource {
    var: String,
}

impl EnvSecretSource {
    /// Read from the named environment variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn signing_key(&self) -> Result<Option<Secret>, SecretError> {
        match std::env::var(&self.var) {
            Ok(value) => Ok(Secret::non_blank(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::NotUnicode(self.var.clone())),
        }
    }

    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// Reads the key from a file, e.g. a mounted secret volume.
///
/// A missing file means "not configured".
#[derive(Debug, Clone)]
pub struct FileSecretSource {
    path: PathBuf,
}

impl FileSecretSource {
    /// Read from the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretSource for FileSecretSource {
    async fn signing_key(&self) -> Result<Option<Secret>, SecretError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(value) => Ok(Secret::non_blank(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SecretError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// A fixed secret, or none. For embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretSource {
    secret: Option<Secret>,
}

impl StaticSecretSource {
    /// A source that always returns `secret`, or none when it is blank.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Secret::non_blank(secret.into()),
        }
    }

    /// A source with no key configured.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretSource for StaticSecretSource {
    async fn signing_key(&self) -> Result<Option<Secret>, SecretError> {
        Ok(self.secret.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_static_source() {
        let s = StaticSecretSource::new("abc");
        assert_eq!(s.signing_key().await.unwrap(), Some(Secret::new("abc")));
        assert_eq!(StaticSecretSource::empty().signing_key().await.unwrap(), None);
        assert_eq!(StaticSecretSource::new("  \n").signing_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_env_source_missing_var() {
        let s = EnvSecretSource::new("AGENT_MANIFEST_TEST_VAR_THAT_IS_NEVER_SET");
        assert_eq!(s.signing_key().await.unwrap(), None);
        assert_eq!(s.describe(), "env:AGENT_MANIFEST_TEST_VAR_THAT_IS_NEVER_SET");
    }

    #[tokio::test]
    async fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "c2VjcmV0").unwrap();

        let s = FileSecretSource::new(file.path());
        let secret = s.signing_key().await.unwrap().unwrap();
        assert_eq!(secret.expose().trim(), "c2VjcmV0");
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileSecretSource::new(dir.path().join("absent.key"));
        assert_eq!(s.signing_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_source_unreadable() {
        // A directory cannot be read as a string.
        let dir = tempfile::tempdir().unwrap();
        let s = FileSecretSource::new(dir.path());
        assert!(matches!(s.signing_key().await, Err(SecretError::Io { .. })));
    }

    #[test]
    fn test_secret_debug_redacted() {
        assert_eq!(format!("{:?}", Secret::new("hunter2")), "Secret(<redacted>)");
    }
}
