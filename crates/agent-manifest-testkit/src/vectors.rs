//! Golden vectors for cross-implementation verification.
//!
//! Every value here was computed by an independent Ed25519 and JSON
//! implementation. Any publisher or verifier, in any language, must
//! reproduce them byte for byte.

use agent_manifest_core::{
    canonical_string, KeyMaterial, Manifest, ManifestKey, ManifestSigner, SignedBlocks,
};

/// Key derivation vector.
#[derive(Debug, Clone)]
pub struct KeyVector {
    pub name: &'static str,
    /// 32-byte seed, hex.
    pub seed: &'static str,
    /// Raw public key, hex.
    pub public_key: &'static str,
    /// SPKI PEM with LF line endings.
    pub public_key_pem: &'static str,
    /// The seed as a base64 raw-seed secret.
    pub seed_base64: &'static str,
    /// The seed wrapped as a base64 PKCS#8 secret.
    pub pkcs8_base64: &'static str,
    /// Signature over the empty message, hex.
    pub empty_signature: &'static str,
}

/// Manifest signing vector. Signed with every block, default selection.
#[derive(Debug, Clone)]
pub struct SignatureVector {
    pub name: &'static str,
    /// Manifest as authored. Key order is deliberately not canonical.
    pub manifest: &'static str,
    /// Expected canonical payload.
    pub canonical: &'static str,
    /// Expected base64 signature per key vector, keyed by [`KeyVector::name`].
    pub signatures: &'static [(&'static str, &'static str)],
}

pub const RFC8032_TEST_1: KeyVector = KeyVector {
    name: "rfc8032-test-1",
    seed: "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
    public_key: "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
    public_key_pem: "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEA11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=\n-----END PUBLIC KEY-----\n",
    seed_base64: "nWGxne/9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A=",
    pkcs8_base64: "MC4CAQAwBQYDK2VwBCIEIJ1hsZ3v/VpguoRK9JLsLMREScVpezJpGXA7rAMcrn9g",
    empty_signature: "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b",
};

pub const SEED_42: KeyVector = KeyVector {
    name: "seed-0x42",
    seed: "4242424242424242424242424242424242424242424242424242424242424242",
    public_key: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
    public_key_pem: "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEAIVL40Zt5HSRFMkLhXy6rbLfP+ntqXtMAl5YOBpiB2xI=\n-----END PUBLIC KEY-----\n",
    seed_base64: "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=",
    pkcs8_base64: "MC4CAQAwBQYDK2VwBCIEIEJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJC",
    empty_signature: "3f9f3147d0dd159f334cb800435ae49a2837adae5e6b2394906edc2cfed829785e3dd186eb2fed1319a0451917cb6617fcbe9382e0d1343eb5ffd4a9a2dd820c",
};

/// All key vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    vec![RFC8032_TEST_1, SEED_42]
}

/// All manifest signing vectors.
pub fn signature_vectors() -> Vec<SignatureVector> {
    vec![
        SignatureVector {
            name: "minimal",
            manifest: r#"{"metadata":{"title":"X"},"feed_type":"mcp"}"#,
            canonical: r#"{"feed_type":"mcp","metadata":{"title":"X"}}"#,
            signatures: &[
                (
                    "rfc8032-test-1",
                    "wDRS0PAn7Ie40dxuce7NFuYInFQr6TCGBRMOdczcwIjUE8Su1+vRA4aktrCy+jkCilQJ4Ofhfbd/eG1OZ6OmAw==",
                ),
                (
                    "seed-0x42",
                    "r0AlT79Ds/w8vWiLXmzMiC8Q1vUZeaC7nIKk1oO0G6fpbk9VQA5qPmci83HyLGiQl2/3j4mCfvPfDSRxol0XCA==",
                ),
            ],
        },
        SignatureVector {
            name: "mixed scalars",
            manifest: r#"{"version":1,"tools":[{"name":"get_projects","description":"List portfolio projects"},{"name":"get_skills"}],"feed_type":"mcp","contact":null,"metadata":{"title":"X"},"active":true}"#,
            canonical: r#"{"active":true,"contact":null,"feed_type":"mcp","metadata":{"title":"X"},"tools":[{"description":"List portfolio projects","name":"get_projects"},{"name":"get_skills"}],"version":1}"#,
            signatures: &[
                (
                    "rfc8032-test-1",
                    "ysOl5qUn55rj4JDB+OFEaNXXXG0fT8U6VuSJY2iIeiHLuQ5fvw0oYLCzRPNf6zLqIONDVUHH3gmgcOQSvlbMCg==",
                ),
                (
                    "seed-0x42",
                    "/F9U3ZkdrwQvLP8CNREcLwOMBTGCHpkUC9R+jUBs9czet9iIjxXsMtyH6WzeFKFaN7VdzOYWPRFVVPFhXWy3DA==",
                ),
            ],
        },
        SignatureVector {
            name: "unicode keys and escapes",
            manifest: r#"{"😀":4,"z":1,"a":-12,"é":2,"Ａ":3,"A":[{},[],null,"line\nbreak\u0001\"q\""]}"#,
            canonical: r#"{"A":[{},[],null,"line\nbreak\u0001\"q\""],"a":-12,"z":1,"é":2,"Ａ":3,"😀":4}"#,
            signatures: &[
                (
                    "rfc8032-test-1",
                    "rrA9XGPKo0CFUsF49VtN1kxaQOUL8Gc0XecMxz4HYR7nQXhmap7hA59XadiiFpuKecbTPxbErG87EerLXhLxAQ==",
                ),
                (
                    "seed-0x42",
                    "UyL9/WXXLN7jgA/B/qJ6wogVZ0jSr1OLEHU1KND2eHnjUeD2ZKiYDxvIxpdmh0T8KBWyTK6ThIJqNGXAfqB0Ag==",
                ),
            ],
        },
        SignatureVector {
            name: "default discovery document",
            manifest: r#"{"feed_type":"mcp","version":"1.0","metadata":{"title":"Portfolio","description":"Personal portfolio: projects, skills and contact details","author":"Site owner","url":"https://example.dev"},"capabilities":{"mcp_endpoint":"/api/mcp","tools":[{"name":"get_projects","description":"List portfolio projects"},{"name":"get_skills","description":"List skills grouped by area"},{"name":"get_contact","description":"How to get in touch"}]}}"#,
            canonical: r#"{"capabilities":{"mcp_endpoint":"/api/mcp","tools":[{"description":"List portfolio projects","name":"get_projects"},{"description":"List skills grouped by area","name":"get_skills"},{"description":"How to get in touch","name":"get_contact"}]},"feed_type":"mcp","metadata":{"author":"Site owner","description":"Personal portfolio: projects, skills and contact details","title":"Portfolio","url":"https://example.dev"},"version":"1.0"}"#,
            signatures: &[
                (
                    "rfc8032-test-1",
                    "0fm/fnZTNZFemJjGTdEaS4RqU2aXf+BZP6ryLA+ChqyMBn7abKg6SexP4dQe71I7dBXWhC5eY+ss+7Z3wiOEDw==",
                ),
                (
                    "seed-0x42",
                    "xyA164TGlgo7QNHhvK0k5ateRRGBuEwnxPLl+ljJ0WQ5n4mOnk7gkQ+2F6mvXzLh8GcQZH5ol2rSOCPKHxLBBQ==",
                ),
            ],
        },
    ]
}

impl KeyVector {
    /// The seed as key material.
    pub fn material(&self) -> KeyMaterial {
        let mut seed = [0u8; 32];
        // Vector seeds are fixed 64-char hex literals.
        hex::decode_to_slice(self.seed, &mut seed).expect("vector seed is valid hex");
        KeyMaterial::RawSeed(seed)
    }

    /// The signing key for this vector.
    pub fn key(&self) -> ManifestKey {
        ManifestKey::import(&self.material()).expect("vector seed imports")
    }
}

/// Look up a key vector by name.
pub fn key_vector(name: &str) -> Option<KeyVector> {
    key_vectors().into_iter().find(|v| v.name == name)
}

/// Check one signature vector against this implementation.
pub fn check_signature_vector(vector: &SignatureVector) -> Result<(), String> {
    let value: serde_json::Value = serde_json::from_str(vector.manifest)
        .map_err(|e| format!("{}: manifest does not parse: {e}", vector.name))?;

    let canonical = canonical_string(&value).map_err(|e| format!("{}: {e}", vector.name))?;
    if canonical != vector.canonical {
        return Err(format!(
            "{}: canonical mismatch\n  expected {}\n  actual   {}",
            vector.name, vector.canonical, canonical
        ));
    }

    let manifest = Manifest::from_value(value).map_err(|e| format!("{}: {e}", vector.name))?;
    for (key_name, expected) in vector.signatures {
        let key = key_vector(key_name).ok_or_else(|| format!("unknown key vector {key_name}"))?;
        let signature = ManifestSigner::new(key.key())
            .sign(&manifest, &SignedBlocks::All)
            .map_err(|e| format!("{}: {e}", vector.name))?;
        if signature.value != *expected {
            return Err(format!(
                "{} / {}: signature mismatch\n  expected {}\n  actual   {}",
                vector.name, key_name, expected, signature.value
            ));
        }
    }
    Ok(())
}

/// Check every signature vector, collecting all failures.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = signature_vectors()
        .iter()
        .filter_map(|v| check_signature_vector(v).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        if let Err(failures) = verify_all_vectors() {
            panic!("golden vector failures:\n{}", failures.join("\n"));
        }
    }

    #[test]
    fn test_key_vectors() {
        for v in key_vectors() {
            let key = v.key();
            assert_eq!(key.public_key().to_hex(), v.public_key, "{}", v.name);
            assert_eq!(key.public_key().to_pem().unwrap(), v.public_key_pem, "{}", v.name);
            assert_eq!(hex::encode(key.sign(b"").0), v.empty_signature, "{}", v.name);
        }
    }

    #[test]
    fn test_secret_encodings_agree() {
        for v in key_vectors() {
            let from_seed = ManifestKey::from_base64(v.seed_base64).unwrap();
            let from_pkcs8 = ManifestKey::from_base64(v.pkcs8_base64).unwrap();
            assert_eq!(from_seed.public_key(), from_pkcs8.public_key(), "{}", v.name);
            assert_eq!(v.material().to_base64(), v.seed_base64, "{}", v.name);
        }
    }
}
