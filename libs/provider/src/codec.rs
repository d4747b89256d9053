//! Conversion between typed resource state, JSON attribute snapshots and the
//! backend wire representation.
//!
//! Absent and `null` values decode to `None`. Present-but-empty values are
//! kept as they are. Collections always decode to a container, empty when
//! the backend returned nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::CodecError;

static NULL: Value = Value::Null;

/// Decodes a numeric field the backend transmits as a string.
pub fn decode_int(field: &'static str, raw: Option<&str>) -> Result<Option<i64>, CodecError> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|source| CodecError::InvalidInteger {
                field,
                value: value.to_string(),
                source,
            }),
    }
}

pub fn encode_int(value: Option<i64>) -> Option<String> {
    value.map(|number| number.to_string())
}

/// Flattens a backend string list, dropping `null` entries and duplicates.
pub fn flatten_strings(values: Option<Vec<Option<String>>>) -> BTreeSet<String> {
    values.into_iter().flatten().flatten().collect()
}

/// Flattens a backend record list, keeping the first record seen for each
/// natural key.
pub fn flatten_records<W, T, K>(
    values: Option<Vec<Option<W>>>,
    key: impl Fn(&T) -> K,
    convert: impl Fn(W) -> T,
) -> BTreeSet<T>
where
    T: Ord,
    K: Ord,
{
    let mut by_key = BTreeMap::new();
    for record in values.into_iter().flatten().flatten() {
        let item = convert(record);
        by_key.entry(key(&item)).or_insert(item);
    }
    by_key.into_values().collect()
}

/// Expands an optional set into the array the backend expects; `None` is
/// sent as an empty array.
pub fn expand_set<T, W>(values: Option<&BTreeSet<T>>, convert: impl Fn(&T) -> W) -> Vec<W> {
    values
        .map(|set| set.iter().map(convert).collect())
        .unwrap_or_default()
}

/// Decodes the object stored under `key` in a GraphQL `data` payload.
/// A missing payload, a missing key or a `null` value all yield `None`.
pub fn decode_payload<T: DeserializeOwned>(
    key: &'static str,
    raw: &[u8],
) -> Result<Option<T>, CodecError> {
    let data: Value = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(raw).map_err(|source| CodecError::Decode { field: key, source })?
    };
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| CodecError::Decode { field: key, source }),
    }
}

pub fn encode_value<T: Serialize>(field: &'static str, value: &T) -> Result<Value, CodecError> {
    serde_json::to_value(value).map_err(|source| CodecError::Encode { field, source })
}

/// Attribute snapshot exchanged with the configuration engine, keyed by the
/// attribute names a resource type declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(resource: &'static str, value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(CodecError::NotAnObject { resource }),
        }
    }

    /// Snapshot of a state whose field names already match its attribute names.
    pub fn from_serialize<T: Serialize>(resource: &'static str, state: &T) -> Result<Self, CodecError> {
        Self::from_value(resource, encode_value(resource, state)?)
    }

    pub fn deserialize<T: DeserializeOwned>(&self, resource: &'static str) -> Result<T, CodecError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|source| CodecError::Decode { field: resource, source })
    }

    pub fn set<T: Serialize>(&mut self, field: &'static str, value: &T) -> Result<(), CodecError> {
        let encoded = encode_value(field, value)?;
        self.0.insert(field.to_string(), encoded);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, field: &'static str) -> Result<Option<T>, CodecError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| CodecError::Decode { field, source }),
        }
    }

    /// Raw value of `field`, `null` when absent.
    pub fn value(&self, field: &str) -> &Value {
        self.0.get(field).unwrap_or(&NULL)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
