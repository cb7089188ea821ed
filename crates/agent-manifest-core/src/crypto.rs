//! Ed25519 key handling: private key loading, public keys, signatures.
//!
//! Private keys arrive as base64 in one of two encodings, told apart by their
//! decoded length:
//! - 32 bytes: a raw seed
//! - 48 bytes: a PKCS#8 `PrivateKeyInfo` wrapping the seed
//!
//! Both are imported through PKCS#8 so the two forms of the same seed yield
//! the same key.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD as BASE64};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{KeyFormatError, PublicKeyError, SignError, VerifyError};

/// Length of a raw Ed25519 seed.
pub const RAW_SEED_LEN: usize = 32;

/// Length of a PKCS#8-wrapped Ed25519 seed.
pub const PKCS8_LEN: usize = 48;

/// ASN.1 prefix of a PKCS#8 v1 Ed25519 private key; the seed follows.
pub const PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// ASN.1 prefix of an Ed25519 SubjectPublicKeyInfo; the 32-byte key follows.
pub const SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Standard alphabet, padding optional. Secret stores differ on whether they
/// keep the trailing `=`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Private key material as supplied by configuration.
///
/// Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// A bare 32-byte seed.
    RawSeed([u8; RAW_SEED_LEN]),
    /// A 48-byte PKCS#8 DER document.
    Pkcs8([u8; PKCS8_LEN]),
}

impl KeyMaterial {
    /// Classify decoded key bytes by length.
    pub fn parse(bytes: &[u8]) -> Result<Self, KeyFormatError> {
        if let Ok(seed) = <[u8; RAW_SEED_LEN]>::try_from(bytes) {
            return Ok(KeyMaterial::RawSeed(seed));
        }
        if let Ok(der) = <[u8; PKCS8_LEN]>::try_from(bytes) {
            return Ok(KeyMaterial::Pkcs8(der));
        }
        Err(KeyFormatError::InvalidLength { got: bytes.len() })
    }

    /// Decode a base64 secret and classify it.
    ///
    /// ASCII whitespace anywhere in the secret is ignored, so wrapped or
    /// newline-terminated values from a secrets file decode. Padding is optional.
    pub fn from_base64(secret: &str) -> Result<Self, KeyFormatError> {
        let compact: Zeroizing<String> = Zeroizing::new(
            secret
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect(),
        );
        let bytes = Zeroizing::new(
            LENIENT_BASE64
                .decode(compact.as_bytes())
                .map_err(|_| KeyFormatError::Base64)?,
        );
        Self::parse(&bytes)
    }

    /// The PKCS#8 DER form of this key.
    pub fn to_pkcs8_der(&self) -> [u8; PKCS8_LEN] {
        match self {
            KeyMaterial::Pkcs8(der) => *der,
            KeyMaterial::RawSeed(seed) => {
                let mut der = [0u8; PKCS8_LEN];
                der[..PKCS8_PREFIX.len()].copy_from_slice(&PKCS8_PREFIX);
                der[PKCS8_PREFIX.len()..].copy_from_slice(seed);
                der
            }
        }
    }

    /// Encode back to the base64 form accepted by [`KeyMaterial::from_base64`].
    pub fn to_base64(&self) -> String {
        match self {
            KeyMaterial::RawSeed(seed) => BASE64.encode(seed),
            KeyMaterial::Pkcs8(der) => BASE64.encode(der),
        }
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        match self {
            KeyMaterial::RawSeed(seed) => seed.zeroize(),
            KeyMaterial::Pkcs8(der) => der.zeroize(),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::RawSeed(_) => write!(f, "KeyMaterial::RawSeed(<redacted>)"),
            KeyMaterial::Pkcs8(_) => write!(f, "KeyMaterial::Pkcs8(<redacted>)"),
        }
    }
}

/// A signing-only Ed25519 key handle.
///
/// The secret cannot be read back out. Key bytes are zeroized on drop.
pub struct ManifestKey {
    signing_key: SigningKey,
}

impl ManifestKey {
    /// Import key material.
    pub fn import(material: &KeyMaterial) -> Result<Self, SignError> {
        let der = Zeroizing::new(material.to_pkcs8_der());
        let signing_key =
            SigningKey::from_pkcs8_der(der.as_slice()).map_err(|e| SignError::KeyImport(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// Decode and import a base64 secret.
    pub fn from_base64(secret: &str) -> Result<Self, SignError> {
        let material = KeyMaterial::from_base64(secret)?;
        Self::import(&material)
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for ManifestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManifestKey({:?})", self.public_key())
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Create from raw bytes, checking that they encode a curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, PublicKeyError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| PublicKeyError::InvalidPoint)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, PublicKeyError> {
        let bytes = hex::decode(s.trim()).map_err(|e| PublicKeyError::Hex(e.to_string()))?;
        Self::from_raw(&bytes)
    }

    /// Parse a PEM `PUBLIC KEY` (SubjectPublicKeyInfo) document.
    pub fn from_pem(pem: &str) -> Result<Self, PublicKeyError> {
        let key = VerifyingKey::from_public_key_pem(pem.trim())
            .map_err(|e| PublicKeyError::Pem(e.to_string()))?;
        Ok(Self(key.to_bytes()))
    }

    /// Parse a DER SubjectPublicKeyInfo.
    pub fn from_der(der: &[u8]) -> Result<Self, PublicKeyError> {
        let key = VerifyingKey::from_public_key_der(der)
            .map_err(|e| PublicKeyError::Der(e.to_string()))?;
        Ok(Self(key.to_bytes()))
    }

    /// Parse raw 32 bytes.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, PublicKeyError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PublicKeyError::InvalidLength(bytes.len()))?;
        Self::from_bytes(arr)
    }

    /// Parse whichever form `bytes` holds: PEM text, SPKI DER, or raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, PublicKeyError> {
        if bytes.len() == 32 {
            return Self::from_raw(bytes);
        }
        if bytes.starts_with(&SPKI_PREFIX) {
            return Self::from_der(bytes);
        }
        let text = std::str::from_utf8(bytes).map_err(|e| PublicKeyError::Pem(e.to_string()))?;
        Self::from_pem(text)
    }

    /// SubjectPublicKeyInfo DER encoding.
    pub fn to_der(&self) -> Vec<u8> {
        let mut der = Vec::with_capacity(SPKI_PREFIX.len() + 32);
        der.extend_from_slice(&SPKI_PREFIX);
        der.extend_from_slice(&self.0);
        der
    }

    /// PEM encoding with LF line endings, as published at the well-known location.
    pub fn to_pem(&self) -> Result<String, PublicKeyError> {
        let key = self.verifying_key().map_err(|_| PublicKeyError::InvalidPoint)?;
        key.to_public_key_pem(LineEnding::LF)
            .map_err(|e| PublicKeyError::Pem(e.to_string()))
    }

    /// Hex SHA-256 of the SPKI DER encoding; a stable key identifier.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_der()))
    }

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), VerifyError> {
        let key = self
            .verifying_key()
            .map_err(|_| VerifyError::MalformedEnvelope("public key is not a valid point".into()))?;
        let sig = Signature::from_bytes(&signature.0);
        key.verify(message, &sig)
            .map_err(|_| VerifyError::SignatureMismatch)
    }

    fn verifying_key(&self) -> Result<VerifyingKey, ed25519_dalek::SignatureError> {
        VerifyingKey::from_bytes(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Standard (padded) base64, the published form.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decode the published base64 form.
    pub fn from_base64(s: &str) -> Result<Self, VerifyError> {
        let bytes = BASE64
            .decode(s)
            .map_err(|e| VerifyError::MalformedEnvelope(format!("invalid base64 signature: {e}")))?;
        let arr: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            VerifyError::MalformedEnvelope(format!(
                "signature must be 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032 section 7.1, test 1.
    const RFC_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const RFC_PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const RFC_SIG_EMPTY: &str = "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b";
    const RFC_PEM: &str = "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEA11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=\n-----END PUBLIC KEY-----\n";

    fn rfc_seed() -> [u8; 32] {
        hex::decode(RFC_SEED).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_raw_seed_matches_rfc8032() {
        let key = ManifestKey::import(&KeyMaterial::RawSeed(rfc_seed())).unwrap();
        assert_eq!(key.public_key().to_hex(), RFC_PUBLIC);
        assert_eq!(key.sign(b"").to_hex(), RFC_SIG_EMPTY);
    }

    #[test]
    fn test_pkcs8_and_raw_seed_equivalent() {
        let raw = KeyMaterial::RawSeed(rfc_seed());
        let wrapped = KeyMaterial::Pkcs8(raw.to_pkcs8_der());

        let k1 = ManifestKey::import(&raw).unwrap();
        let k2 = ManifestKey::import(&wrapped).unwrap();

        let message = br#"{"feed_type":"mcp"}"#;
        assert_eq!(k1.sign(message), k2.sign(message));
        assert_eq!(k1.public_key(), k2.public_key());
    }

    #[test]
    fn test_pkcs8_wrapping_layout() {
        let der = KeyMaterial::RawSeed([0x42; 32]).to_pkcs8_der();
        assert_eq!(&der[..16], &PKCS8_PREFIX);
        assert_eq!(&der[16..], &[0x42; 32]);
    }

    #[test]
    fn test_base64_dispatch() {
        let seed_b64 = "nWGxne/9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A=";
        let pkcs8_b64 = "MC4CAQAwBQYDK2VwBCIEIJ1hsZ3v/VpguoRK9JLsLMREScVpezJpGXA7rAMcrn9g";

        assert_eq!(
            KeyMaterial::from_base64(seed_b64).unwrap(),
            KeyMaterial::RawSeed(rfc_seed())
        );
        assert!(matches!(
            KeyMaterial::from_base64(pkcs8_b64).unwrap(),
            KeyMaterial::Pkcs8(_)
        ));
        assert_eq!(
            KeyMaterial::from_base64(&format!("{seed_b64}\n")).unwrap(),
            KeyMaterial::RawSeed(rfc_seed())
        );
    }

    #[test]
    fn test_base64_padding_and_wrapping_tolerated() {
        let expected = KeyMaterial::RawSeed(rfc_seed());
        for secret in [
            "nWGxne/9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A",
            "nWGxne/9WmC6hEr0\nkuwsxERJxWl7MmkZcDusAxyuf2A=",
            "  nWGxne/9WmC6hEr0kuwsxERJ\r\nxWl7MmkZcDusAxyuf2A=\n",
            "nWGxne/9 WmC6hEr0\tkuwsxERJxWl7MmkZcDusAxyuf2A",
        ] {
            assert_eq!(KeyMaterial::from_base64(secret).unwrap(), expected, "{secret:?}");
        }

        let wrapped_pkcs8 = "MC4CAQAwBQYDK2VwBCIEIJ1hsZ3v/Vpg\nuoRK9JLsLMREScVpezJpGXA7rAMcrn9g\n";
        let key = ManifestKey::from_base64(wrapped_pkcs8).unwrap();
        assert_eq!(key.public_key().to_hex(), RFC_PUBLIC);
    }

    #[test]
    fn test_invalid_lengths_reported() {
        for len in [0usize, 20, 31, 33, 47, 49, 50, 64] {
            let bytes = vec![7u8; len];
            assert_eq!(
                KeyMaterial::parse(&bytes),
                Err(KeyFormatError::InvalidLength { got: len })
            );
        }

        let err = KeyMaterial::from_base64(&BASE64.encode([1u8; 20])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("20"), "{msg}");
        assert!(msg.contains("32") && msg.contains("48"), "{msg}");
    }

    #[test]
    fn test_bad_base64() {
        assert!(matches!(
            KeyMaterial::from_base64("not base64!!"),
            Err(KeyFormatError::Base64)
        ));
    }

    #[test]
    fn test_corrupt_pkcs8_rejected_on_import() {
        let mut der = KeyMaterial::RawSeed([0x42; 32]).to_pkcs8_der();
        der[0] = 0x31;
        assert!(matches!(
            ManifestKey::import(&KeyMaterial::Pkcs8(der)),
            Err(SignError::KeyImport(_))
        ));
    }

    #[test]
    fn test_public_key_pem() {
        let key = ManifestKey::import(&KeyMaterial::RawSeed(rfc_seed())).unwrap();
        let pk = key.public_key();

        assert_eq!(pk.to_pem().unwrap(), RFC_PEM);
        assert_eq!(PublicKey::from_pem(RFC_PEM).unwrap(), pk);
        assert_eq!(PublicKey::parse(RFC_PEM.as_bytes()).unwrap(), pk);
    }

    #[test]
    fn test_public_key_der_forms_agree() {
        let pk = ManifestKey::generate().public_key();
        let der = pk.to_der();
        let library_der = VerifyingKey::from_bytes(pk.as_bytes())
            .unwrap()
            .to_public_key_der()
            .unwrap();
        assert_eq!(der, library_der.as_bytes());
        assert_eq!(PublicKey::from_der(&der).unwrap(), pk);
        assert_eq!(PublicKey::parse(&der).unwrap(), pk);
        assert_eq!(PublicKey::parse(pk.as_bytes()).unwrap(), pk);
        assert_eq!(PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
    }

    #[test]
    fn test_public_key_rejects_bad_length() {
        assert!(matches!(
            PublicKey::from_raw(&[1u8; 31]),
            Err(PublicKeyError::InvalidLength(31))
        ));
    }

    #[test]
    fn test_fingerprint_stable() {
        let pk = ManifestKey::import(&KeyMaterial::RawSeed(rfc_seed()))
            .unwrap()
            .public_key();
        assert_eq!(pk.fingerprint(), pk.fingerprint());
        assert_eq!(pk.fingerprint().len(), 64);
    }

    #[test]
    fn test_sign_verify() {
        let key = ManifestKey::generate();
        let sig = key.sign(b"hello world");

        key.public_key().verify(b"hello world", &sig).unwrap();
        assert!(matches!(
            key.public_key().verify(b"hello worlD", &sig),
            Err(VerifyError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_signature_base64() {
        let key = ManifestKey::generate();
        let sig = key.sign(b"msg");
        assert_eq!(Ed25519Signature::from_base64(&sig.to_base64()).unwrap(), sig);
        assert!(matches!(
            Ed25519Signature::from_base64(&BASE64.encode([0u8; 10])),
            Err(VerifyError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let material = KeyMaterial::RawSeed([0x42; 32]);
        assert!(!format!("{material:?}").contains("42"));
        let key = ManifestKey::import(&material).unwrap();
        assert!(format!("{key:?}").starts_with("ManifestKey(PublicKey("));
    }
}
