//! The published envelope: manifest fields plus `trust` and `signature`.
//!
//! ```text
//! {
//!   ...manifest fields,
//!   "trust": { "signed_blocks": [...], "algorithm": "Ed25519",
//!              "public_key_hint": "...", "trust_level": "self-signed" | "unsigned",
//!              "scope"?: "...", "note"?: "...", "error"?: "..." },
//!   "signature"?: { "value": "<base64>", "created_at": "<RFC 3339>" }
//! }
//! ```
//!
//! `signature` is present iff `trust_level` is `self-signed`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::VerifyError;
use crate::manifest::{json_type_name, Manifest, SIGNATURE_FIELD, TRUST_FIELD};

/// The only signature algorithm published.
pub const ALGORITHM: &str = "Ed25519";

/// Whether the envelope carries a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustLevel {
    #[serde(rename = "self-signed")]
    SelfSigned,
    #[serde(rename = "unsigned")]
    Unsigned,
}

/// The `trust` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustBlock {
    pub signed_blocks: Vec<String>,
    pub algorithm: String,
    pub public_key_hint: String,
    pub trust_level: TrustLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrustBlock {
    /// Trust block for a signed envelope.
    pub fn self_signed(signed_blocks: Vec<String>, public_key_hint: impl Into<String>) -> Self {
        Self {
            signed_blocks,
            algorithm: ALGORITHM.to_string(),
            public_key_hint: public_key_hint.into(),
            trust_level: TrustLevel::SelfSigned,
            scope: None,
            note: None,
            error: None,
        }
    }

    /// Trust block for an unsigned envelope.
    ///
    /// `signed_blocks` still lists the fields a signature would have covered.
    pub fn unsigned(signed_blocks: Vec<String>, public_key_hint: impl Into<String>) -> Self {
        Self {
            trust_level: TrustLevel::Unsigned,
            ..Self::self_signed(signed_blocks, public_key_hint)
        }
    }

    /// Set the coverage label, e.g. `full` or `partial`.
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// Attach a human-readable note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Record why signing failed.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The `signature` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Base64 of the 64 raw signature bytes.
    pub value: String,
    /// RFC 3339 UTC timestamp, millisecond precision.
    pub created_at: String,
}

impl SignatureBlock {
    /// Signature block for a base64 `value` made at `created_at`.
    pub fn new(value: String, created_at: DateTime<Utc>) -> Self {
        Self {
            value,
            created_at: format_timestamp(created_at),
        }
    }
}

/// Format a timestamp the way envelopes carry it: `2026-01-14T12:00:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A manifest with its trust metadata, as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub manifest: Manifest,
    pub trust: TrustBlock,
    pub signature: Option<SignatureBlock>,
}

impl SignedEnvelope {
    /// Envelope without a signature.
    pub fn unsigned(manifest: Manifest, trust: TrustBlock) -> Self {
        Self {
            manifest,
            trust,
            signature: None,
        }
    }

    /// The declared trust level.
    pub fn trust_level(&self) -> TrustLevel {
        self.trust.trust_level
    }

    /// Whether a signature block is present.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Render as the published JSON object: manifest fields first, then
    /// `trust`, then `signature` when present.
    pub fn to_value(&self) -> Value {
        let mut map = self.manifest.as_map().clone();
        map.insert(TRUST_FIELD.to_string(), trust_to_value(&self.trust));
        if let Some(sig) = &self.signature {
            map.insert(
                SIGNATURE_FIELD.to_string(),
                Value::Object(signature_to_map(sig)),
            );
        }
        Value::Object(map)
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Indented JSON text, the form served to consumers.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value())
    }

    /// Parse a published document.
    ///
    /// Only the shape is checked here; whether `signature` agrees with
    /// `trust_level` is left to the verifier.
    pub fn from_value(value: Value) -> Result<Self, VerifyError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(VerifyError::MalformedEnvelope(format!(
                    "envelope must be an object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let trust = map
            .remove(TRUST_FIELD)
            .ok_or_else(|| VerifyError::MalformedEnvelope("missing trust block".into()))?;
        let trust: TrustBlock = serde_json::from_value(trust)
            .map_err(|e| VerifyError::MalformedEnvelope(format!("invalid trust block: {e}")))?;

        let signature = match map.remove(SIGNATURE_FIELD) {
            None => None,
            Some(sig) => Some(serde_json::from_value::<SignatureBlock>(sig).map_err(|e| {
                VerifyError::MalformedEnvelope(format!("invalid signature block: {e}"))
            })?),
        };

        let manifest = Manifest::from_map(map)?;
        Ok(Self {
            manifest,
            trust,
            signature,
        })
    }

    /// Parse published JSON text.
    pub fn from_json(text: &str) -> Result<Self, VerifyError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| VerifyError::MalformedEnvelope(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }
}

fn trust_to_value(trust: &TrustBlock) -> Value {
    let mut map = Map::new();
    map.insert(
        "signed_blocks".into(),
        Value::Array(trust.signed_blocks.iter().cloned().map(Value::String).collect()),
    );
    map.insert("algorithm".into(), Value::String(trust.algorithm.clone()));
    map.insert(
        "public_key_hint".into(),
        Value::String(trust.public_key_hint.clone()),
    );
    let level = match trust.trust_level {
        TrustLevel::SelfSigned => "self-signed",
        TrustLevel::Unsigned => "unsigned",
    };
    map.insert("trust_level".into(), Value::String(level.into()));
    for (key, value) in [
        ("scope", &trust.scope),
        ("note", &trust.note),
        ("error", &trust.error),
    ] {
        if let Some(v) = value {
            map.insert(key.into(), Value::String(v.clone()));
        }
    }
    Value::Object(map)
}

fn signature_to_map(sig: &SignatureBlock) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("value".into(), Value::String(sig.value.clone()));
    map.insert("created_at".into(), Value::String(sig.created_at.clone()));
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> SignedEnvelope {
        let manifest =
            Manifest::from_value(json!({"feed_type": "mcp", "metadata": {"title": "X"}})).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap();
        SignedEnvelope {
            manifest,
            trust: TrustBlock::self_signed(
                vec!["feed_type".into(), "metadata".into()],
                "/.well-known/manifest-key.pem",
            )
            .with_scope(Some("full".into())),
            signature: Some(SignatureBlock::new("c2ln".into(), at)),
        }
    }

    #[test]
    fn test_published_shape() {
        let v = sample().to_value();
        assert_eq!(
            v,
            json!({
                "feed_type": "mcp",
                "metadata": {"title": "X"},
                "trust": {
                    "signed_blocks": ["feed_type", "metadata"],
                    "algorithm": "Ed25519",
                    "public_key_hint": "/.well-known/manifest-key.pem",
                    "trust_level": "self-signed",
                    "scope": "full"
                },
                "signature": {"value": "c2ln", "created_at": "2026-01-14T12:00:00.000Z"}
            })
        );
    }

    #[test]
    fn test_field_order_manifest_then_trust() {
        let v = sample().to_value();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["feed_type", "metadata", "trust", "signature"]);
    }

    #[test]
    fn test_parse_roundtrip() {
        let env = sample();
        let parsed = SignedEnvelope::from_json(&env.to_json()).unwrap();
        assert_eq!(parsed, env);
    }

    #[test]
    fn test_unsigned_has_no_signature_field() {
        let manifest = Manifest::from_value(json!({"a": 1})).unwrap();
        let env = SignedEnvelope::unsigned(
            manifest,
            TrustBlock::unsigned(vec!["a".into()], "hint").with_note("signing key not configured"),
        );
        let v = env.to_value();
        assert!(v.get("signature").is_none());
        assert_eq!(v["trust"]["trust_level"], "unsigned");
        assert_eq!(v["trust"]["note"], "signing key not configured");
        assert!(v["trust"].get("error").is_none());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            SignedEnvelope::from_value(json!([])),
            Err(VerifyError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            SignedEnvelope::from_value(json!({"a": 1})),
            Err(VerifyError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            SignedEnvelope::from_value(json!({"a": 1, "trust": {"algorithm": "Ed25519"}})),
            Err(VerifyError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            SignedEnvelope::from_json("{not json"),
            Err(VerifyError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 5).unwrap();
        assert_eq!(format_timestamp(at), "2026-10-19T08:30:05.000Z");
    }
}
