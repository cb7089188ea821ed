//! The manifest: a JSON object of published capability metadata.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::canonical::to_json_value;
use crate::error::ManifestError;

/// Top-level field carrying the trust block in a published envelope.
pub const TRUST_FIELD: &str = "trust";

/// Top-level field carrying the signature in a published envelope.
pub const SIGNATURE_FIELD: &str = "signature";

/// Field names the envelope owns; a manifest may not use them.
pub const RESERVED_FIELDS: [&str; 2] = [TRUST_FIELD, SIGNATURE_FIELD];

/// A capability manifest.
///
/// Any JSON object without the reserved envelope fields. Field order is the
/// authoring order; it has no effect on signatures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        match value {
            Value::Object(fields) => Self::from_map(fields),
            other => Err(ManifestError::NotAnObject(json_type_name(&other))),
        }
    }

    /// Build a manifest from a JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Result<Self, ManifestError> {
        if let Some(reserved) = RESERVED_FIELDS.iter().find(|f| fields.contains_key(**f)) {
            return Err(ManifestError::ReservedField((*reserved).to_string()));
        }
        Ok(Self { fields })
    }

    /// Build a manifest from any serializable type.
    ///
    /// NaN and infinite floats are rejected rather than written as `null`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ManifestError> {
        Self::from_value(to_json_value(value)?)
    }

    /// Insert or replace a top-level field.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<(), ManifestError> {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(ManifestError::ReservedField(name));
        }
        self.fields.insert(name, value);
        Ok(())
    }

    /// Get a top-level field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Mutable access to a top-level field.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Top-level field names in authoring order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the manifest has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume into the underlying object.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Build the sub-object holding exactly the named fields.
    ///
    /// Fails with [`ManifestError::MissingField`] naming the first absent field.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Map<String, Value>, ManifestError> {
        let mut selected = Map::new();
        for name in names {
            let name = name.as_ref();
            let value = self
                .fields
                .get(name)
                .ok_or_else(|| ManifestError::MissingField(name.to_string()))?;
            selected.insert(name.to_string(), value.clone());
        }
        Ok(selected)
    }
}

impl From<Manifest> for Value {
    fn from(manifest: Manifest) -> Self {
        Value::Object(manifest.fields)
    }
}

impl TryFrom<Value> for Manifest {
    type Error = ManifestError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
