//! Canonical JSON encoding for deterministic signing.
//!
//! The canonical form of a JSON value is:
//! - Object keys sorted at every level by byte-wise comparison of their UTF-8
//!   encoding (equivalently, by Unicode code point)
//! - Array elements kept in their original order
//! - No insignificant whitespace
//! - Strings escaped by `serde_json` (control characters as `\u00XX`,
//!   non-ASCII emitted as raw UTF-8)
//! - Integers written verbatim; other numbers in the ECMAScript
//!   `Number::toString` form (`1e16` is `10000000000000000`, `1e21` is
//!   `1e+21`, `1.0` is `1`), the same text `JSON.stringify` produces
//!
//! Integers beyond 2^53 are exact here but lose precision in a JavaScript
//! verifier; manifests meant for those consumers should keep them as strings.
//!
//! **CRITICAL**: This encoding is FROZEN. Changes break every published
//! signature.

use std::fmt;

use serde::{ser, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::CanonicalError;

/// Maximum nesting depth accepted by the canonicalizer.
///
/// Matches the recursion limit of `serde_json`'s parser, so anything that
/// came off the wire fits.
pub const MAX_DEPTH: usize = 128;

/// Encode a JSON value to canonical bytes.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value, 0)?;
    Ok(buf)
}

/// Encode a JSON value to a canonical string.
pub fn canonical_string(value: &Value) -> Result<String, CanonicalError> {
    let bytes = canonical_bytes(value)?;
    String::from_utf8(bytes).map_err(|e| CanonicalError::Encoding(e.to_string()))
}

/// Encode any serializable value to canonical bytes.
///
/// The value is first converted with [`to_json_value`]; a type that cannot be
/// expressed as JSON is an error rather than silently altered.
pub fn canonical_bytes_of<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    canonical_bytes(&to_json_value(value)?)
}

/// Convert a serializable value to a `serde_json::Value`.
///
/// Fails with [`CanonicalError::Unrepresentable`] on NaN or infinite floats
/// (which `serde_json` would turn into `null`) and on maps keyed by
/// non-strings.
pub fn to_json_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, CanonicalError> {
    value
        .serialize(FiniteCheck)
        .map_err(|e| CanonicalError::Unrepresentable(e.to_string()))?;
    serde_json::to_value(value).map_err(|e| CanonicalError::Unrepresentable(e.to_string()))
}

/// Order two object keys for canonical output.
///
/// Byte-wise on UTF-8, which is code-point order. A verifier in a UTF-16
/// runtime must sort by code point, not by code unit.
pub fn compare_keys(a: &str, b: &str) -> std::cmp::Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// Recursively encode a value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value, depth: usize) -> Result<(), CanonicalError> {
    if depth > MAX_DEPTH {
        return Err(CanonicalError::TooDeep { max: MAX_DEPTH });
    }

    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => encode_number(buf, n)?,
        Value::String(s) => encode_str(buf, s)?,
        Value::Array(arr) => encode_array(buf, arr, depth)?,
        Value::Object(map) => encode_object(buf, map, depth)?,
    }
    Ok(())
}

fn encode_number(buf: &mut Vec<u8>, n: &Number) -> Result<(), CanonicalError> {
    let text = n.to_string();
    if n.is_f64() {
        buf.extend_from_slice(ecmascript_number(&text)?.as_bytes());
    } else {
        buf.extend_from_slice(text.as_bytes());
    }
    Ok(())
}

/// Rewrite a finite float's shortest round-trip text (`1e16`, `0.1`,
/// `1.2345e-7`) in ECMAScript `Number::toString` form.
fn ecmascript_number(text: &str) -> Result<String, CanonicalError> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (mantissa, exponent) = match body.split_once(|c: char| c == 'e' || c == 'E') {
        Some((m, e)) => {
            let e: i32 = e
                .parse()
                .map_err(|_| CanonicalError::Encoding(format!("bad float text {text:?}")))?;
            (m, e)
        }
        None => (body, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    // value = 0.DIGITS * 10^point
    let all_digits = format!("{int_part}{frac_part}");
    let significant = all_digits.trim_start_matches('0');
    let mut point = int_part.len() as i32 + exponent - (all_digits.len() - significant.len()) as i32;
    let digits = significant.trim_end_matches('0');
    if digits.is_empty() {
        // Zero, including negative zero.
        return Ok("0".to_string());
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CanonicalError::Encoding(format!("bad float text {text:?}")));
    }

    let k = digits.len() as i32;
    let mut out = String::with_capacity(k as usize + 8);
    if negative {
        out.push('-');
    }
    if k <= point && point <= 21 {
        out.push_str(digits);
        out.extend(std::iter::repeat('0').take((point - k) as usize));
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(fraction);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-point) as usize));
        out.push_str(digits);
    } else {
        point -= 1;
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if point < 0 { '-' } else { '+' });
        out.push_str(&point.abs().to_string());
    }
    Ok(out)
}

/// Encode a string with `serde_json`'s escaping rules.
fn encode_str(buf: &mut Vec<u8>, s: &str) -> Result<(), CanonicalError> {
    serde_json::to_writer(&mut *buf, s).map_err(|e| CanonicalError::Encoding(e.to_string()))
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value], depth: usize) -> Result<(), CanonicalError> {
    buf.push(b'[');
    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        encode_value_to(buf, item, depth + 1)?;
    }
    buf.push(b']');
    Ok(())
}

/// Encode an object with its keys in canonical order.
///
/// `serde_json::Map` keeps insertion order here (`preserve_order`), so the
/// sort is explicit rather than inherited from the map type.
fn encode_object(
    buf: &mut Vec<u8>,
    map: &Map<String, Value>,
    depth: usize,
) -> Result<(), CanonicalError> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| compare_keys(a.0, b.0));

    buf.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        encode_str(buf, key)?;
        buf.push(b':');
        encode_value_to(buf, value, depth + 1)?;
    }
    buf.push(b'}');
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Non-finite float detection
// ─────────────────────────────────────────────────────────────────────────────

/// Where in a value a problem was found, innermost segment last.
#[derive(Debug)]
enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug)]
struct FiniteCheckError {
    message: String,
    path: Vec<Segment>,
}

impl FiniteCheckError {
    fn non_finite(v: f64) -> Self {
        Self {
            message: format!("non-finite number {v}"),
            path: Vec::new(),
        }
    }

    /// Record an enclosing segment while the error unwinds.
    fn within(mut self, segment: Segment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

impl fmt::Display for FiniteCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at $", self.message)?;
        for segment in &self.path {
            match segment {
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for FiniteCheckError {}

impl ser::Error for FiniteCheckError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            message: msg.to_string(),
            path: Vec::new(),
        }
    }
}

/// A serializer that writes nothing and fails on NaN or infinity.
struct FiniteCheck;

/// Walks the elements of a sequence, map, or struct.
struct FiniteCompound {
    index: usize,
    key: Option<String>,
}

impl FiniteCompound {
    fn new() -> Self {
        Self {
            index: 0,
            key: None,
        }
    }

    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), FiniteCheckError> {
        let index = self.index;
        self.index += 1;
        value
            .serialize(FiniteCheck)
            .map_err(|e| e.within(Segment::Index(index)))
    }

    fn field<T: ?Sized + Serialize>(&mut self, key: &str, value: &T) -> Result<(), FiniteCheckError> {
        value
            .serialize(FiniteCheck)
            .map_err(|e| e.within(Segment::Key(key.to_string())))
    }
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;
    type SerializeSeq = FiniteCompound;
    type SerializeTuple = FiniteCompound;
    type SerializeTupleStruct = FiniteCompound;
    type SerializeTupleVariant = FiniteCompound;
    type SerializeMap = FiniteCompound;
    type SerializeStruct = FiniteCompound;
    type SerializeStructVariant = FiniteCompound;

    fn serialize_bool(self, _: bool) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i8(self, _: i8) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i16(self, _: i16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i32(self, _: i32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i64(self, _: i64) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i128(self, _: i128) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u8(self, _: u8) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u128(self, _: u128) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), Self::Error> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), Self::Error> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(FiniteCheckError::non_finite(v))
        }
    }

    fn serialize_char(self, _: char) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        FiniteCompound::new().field(variant, value)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
    fn serialize_tuple(self, _: usize) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
    fn serialize_map(self, _: Option<usize>) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<FiniteCompound, Self::Error> {
        Ok(FiniteCompound::new())
    }
}

impl ser::SerializeSeq for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.element(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.element(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.element(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.element(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        key.serialize(FiniteCheck)?;
        // String keys name the path; others are reported by serde_json later.
        self.key = serde_json::to_value(key)
            .ok()
            .and_then(|k| k.as_str().map(str::to_string));
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        match self.key.take() {
            Some(key) => self.field(&key, value),
            None => value.serialize(FiniteCheck),
        }
    }

    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.field(key, value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCompound {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.field(key, value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn canon(v: &Value) -> String {
        canonical_string(v).unwrap()
    }

    #[test]
    fn test_sorts_keys_at_every_level() {
        let v = json!({"b": {"z": 1, "a": 2}, "a": [ {"y": null, "x": true} ]});
        assert_eq!(canon(&v), r#"{"a":[{"x":true,"y":null}],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn test_key_order_independent() {
        let mut m1 = Map::new();
        m1.insert("feed_type".into(), json!("mcp"));
        m1.insert("metadata".into(), json!({"title": "X"}));

        let mut m2 = Map::new();
        m2.insert("metadata".into(), json!({"title": "X"}));
        m2.insert("feed_type".into(), json!("mcp"));

        let b1 = canonical_bytes(&Value::Object(m1)).unwrap();
        let b2 = canonical_bytes(&Value::Object(m2)).unwrap();
        assert_eq!(b1, b2);
        assert_eq!(b1, br#"{"feed_type":"mcp","metadata":{"title":"X"}}"#);
    }

    #[test]
    fn test_arrays_not_sorted() {
        let a = canon(&json!({"x": [1, 2]}));
        let b = canon(&json!({"x": [2, 1]}));
        assert_ne!(a, b);
        assert_eq!(a, r#"{"x":[1,2]}"#);
    }

    #[test]
    fn test_empty_structures() {
        assert_eq!(canon(&json!({})), "{}");
        assert_eq!(canon(&json!([])), "[]");
        assert_eq!(canon(&json!({"a": {}, "b": [], "c": [[], {}]})), r#"{"a":{},"b":[],"c":[[],{}]}"#);
    }

    #[test]
    fn test_null_retained() {
        assert_eq!(canon(&json!({"gone": null})), r#"{"gone":null}"#);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(canon(&json!(null)), "null");
        assert_eq!(canon(&json!(true)), "true");
        assert_eq!(canon(&json!(-12)), "-12");
        assert_eq!(canon(&json!(1.5)), "1.5");
        assert_eq!(canon(&json!("hi")), r#""hi""#);
    }

    #[test]
    fn test_non_ascii_key_order_is_code_point_order() {
        // UTF-16 order would put the emoji (0xD83D) before U+FF21.
        let v = json!({"\u{1F600}": 4, "\u{FF21}": 3, "\u{e9}": 2, "z": 1});
        assert_eq!(canon(&v), "{\"z\":1,\"\u{e9}\":2,\"\u{FF21}\":3,\"\u{1F600}\":4}");
    }

    #[test]
    fn test_mixed_case_keys() {
        let v = json!({"b": 1, "B": 2, "a": 3, "A": 4});
        assert_eq!(canon(&v), r#"{"A":4,"B":2,"a":3,"b":1}"#);
    }

    #[test]
    fn test_string_escaping() {
        let v = json!({"s": "line\nbreak\u{1}\"q\"\\"});
        assert_eq!(canon(&v), r#"{"s":"line\nbreak\u0001\"q\"\\"}"#);
    }

    #[test]
    fn test_too_deep_fails() {
        let mut v = json!(0);
        for _ in 0..(MAX_DEPTH + 2) {
            v = json!([v]);
        }
        assert!(matches!(
            canonical_bytes(&v),
            Err(CanonicalError::TooDeep { max: MAX_DEPTH })
        ));
    }

    #[test]
    fn test_max_depth_accepted() {
        let mut v = json!(0);
        for _ in 0..MAX_DEPTH {
            v = json!([v]);
        }
        assert!(canonical_bytes(&v).is_ok());
    }

    #[test]
    fn test_unrepresentable_serialize_input() {
        let mut m: HashMap<(u8, u8), u8> = HashMap::new();
        m.insert((1, 2), 3);
        assert!(matches!(
            canonical_bytes_of(&m),
            Err(CanonicalError::Unrepresentable(_))
        ));
    }

    #[test]
    fn test_canonical_bytes_of_struct() {
        #[derive(Serialize)]
        struct Doc {
            zeta: u32,
            alpha: &'static str,
        }
        let bytes = canonical_bytes_of(&Doc { zeta: 1, alpha: "a" }).unwrap();
        assert_eq!(bytes, br#"{"alpha":"a","zeta":1}"#);
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        #[derive(Serialize)]
        struct Doc {
            score: f64,
        }
        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = canonical_bytes_of(&Doc { score }).unwrap_err();
            match err {
                CanonicalError::Unrepresentable(msg) => {
                    assert!(msg.contains("non-finite"), "{msg}");
                    assert!(msg.ends_with("at $.score"), "{msg}");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_finite_path_through_collections() {
        let mut tools: HashMap<String, Vec<f32>> = HashMap::new();
        tools.insert("weights".into(), vec![0.5, f32::NAN]);
        let err = to_json_value(&tools).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value cannot be represented as JSON: non-finite number NaN at $.weights[1]"
        );
    }

    #[test]
    fn test_finite_floats_accepted() {
        #[derive(Serialize)]
        struct Doc {
            score: f64,
            ratio: Option<f32>,
        }
        let bytes = canonical_bytes_of(&Doc { score: 0.25, ratio: Some(2.0) }).unwrap();
        assert_eq!(bytes, br#"{"ratio":2,"score":0.25}"#);
    }

    #[test]
    fn test_float_text_matches_ecmascript() {
        let cases: [(f64, &str); 12] = [
            (1e16, "10000000000000000"),
            (1e21, "1e+21"),
            (1e20, "100000000000000000000"),
            (1.0, "1"),
            (-0.0, "0"),
            (0.1, "0.1"),
            (0.000001, "0.000001"),
            (1e-7, "1e-7"),
            (-1.5e-9, "-1.5e-9"),
            (123.456, "123.456"),
            (1.2345678901234568e20, "123456789012345680000"),
            (5e-324, "5e-324"),
        ];
        for (value, expected) in cases {
            assert_eq!(canon(&json!(value)), expected, "{value:e}");
        }
        assert_eq!(canon(&json!(f64::MAX)), "1.7976931348623157e+308");
    }

    #[test]
    fn test_integers_verbatim() {
        assert_eq!(canon(&json!(u64::MAX)), "18446744073709551615");
        assert_eq!(canon(&json!(i64::MIN)), "-9223372036854775808");
    }
}
