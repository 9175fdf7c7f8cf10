//! Dynamic request data.
//!
//! # Design
//! `Payload` is a JSON-like tree that can also hold binary blobs and lists of
//! blobs, which is what form uploads need and what `serde_json::Value` cannot
//! express. Objects built with `Payload::object` keep their insertion order
//! so flattened keys come out in the order the caller wrote them. Objects
//! converted from a `serde_json::Value` take the map's order, which is
//! sorted by key.

use bytes::Bytes;
use serde_json::{Map, Number, Value};

use crate::error::CodecError;

/// A binary value with optional file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    mime: Option<String>,
    filename: Option<String>,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime: None,
            filename: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Request data handed to a request before it is encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Payload>),
    Object(Vec<(String, Payload)>),
    Blob(Blob),
    FileList(Vec<Blob>),
}

impl Payload {
    /// Build an object from key/value pairs, keeping their order.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Payload>,
        I: IntoIterator<Item = (K, V)>,
    {
        Payload::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// True for values that are walked rather than sent as-is: objects,
    /// arrays, blobs and file lists.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Payload::Array(_) | Payload::Object(_) | Payload::Blob(_) | Payload::FileList(_)
        )
    }

    /// Own entries of a container, with sequence indices as keys.
    ///
    /// Scalars and blobs have no entries.
    pub fn entries(&self) -> Vec<(String, &Payload)> {
        match self {
            Payload::Object(fields) => fields.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Payload::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// String form of a scalar, as it appears in a query string or form field.
    ///
    /// Returns `None` for containers and blobs.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Payload::Null => Some("null".to_string()),
            Payload::Bool(b) => Some(b.to_string()),
            Payload::Number(n) => Some(n.to_string()),
            Payload::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Convert to a JSON value for structural serializers.
    ///
    /// Binary data has no JSON form, so blobs fail here.
    pub fn to_json(&self) -> Result<Value, CodecError> {
        Ok(match self {
            Payload::Null => Value::Null,
            Payload::Bool(b) => Value::Bool(*b),
            Payload::Number(n) => Value::Number(n.clone()),
            Payload::String(s) => Value::String(s.clone()),
            Payload::Array(items) => {
                Value::Array(items.iter().map(Payload::to_json).collect::<Result<_, _>>()?)
            }
            Payload::Object(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json()?);
                }
                Value::Object(map)
            }
            Payload::Blob(_) | Payload::FileList(_) => {
                return Err(CodecError::new("binary data cannot be represented as JSON"))
            }
        })
    }
}

/// Object keys follow the `serde_json::Map` order, sorted by key.
impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Null,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) => Payload::Number(n),
            Value::String(s) => Payload::String(s),
            Value::Array(items) => Payload::Array(items.into_iter().map(Payload::from).collect()),
            Value::Object(map) => {
                Payload::Object(map.into_iter().map(|(k, v)| (k, Payload::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::String(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::String(s)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Number(n.into())
    }
}

impl From<Blob> for Payload {
    fn from(blob: Blob) -> Self {
        Payload::Blob(blob)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Payload::Array(items)
    }
}
