//! Request header values and their resolution to plain strings.
//!
//! A header value can be a literal string, a closure evaluated at send time,
//! or a structured payload that is rendered as a query string. Values that
//! are "empty" (an empty string, `null`, `false` or `0`) are skipped when the
//! headers are applied to the transport.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::RequestError;
use crate::flatten::query_string;
use crate::payload::Payload;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const JSON_MIME: &str = "application/json";
pub const URL_ENCODED_MIME: &str = "application/x-www-form-urlencoded";

type DeferredFn = dyn Fn() -> HeaderValue + Send + Sync;

#[derive(Clone)]
pub enum HeaderValue {
    Text(String),
    /// Computed each time the headers are resolved.
    Deferred(Arc<DeferredFn>),
    Structured(Payload),
}

impl HeaderValue {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> HeaderValue + Send + Sync + 'static,
    {
        HeaderValue::Deferred(Arc::new(f))
    }

    fn is_empty(&self) -> bool {
        match self {
            HeaderValue::Text(s) => s.is_empty(),
            HeaderValue::Deferred(_) => false,
            HeaderValue::Structured(p) => match p {
                Payload::Null | Payload::Bool(false) => true,
                Payload::String(s) => s.is_empty(),
                Payload::Number(n) => n.as_f64() == Some(0.0),
                _ => false,
            },
        }
    }

    /// Render to the string sent on the wire.
    pub fn resolve(&self) -> String {
        match self {
            HeaderValue::Text(s) => s.clone(),
            HeaderValue::Deferred(f) => f().resolve(),
            HeaderValue::Structured(Payload::String(s)) => s.clone(),
            HeaderValue::Structured(p) => query_string(p),
        }
    }

    fn literal(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) | HeaderValue::Structured(Payload::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            HeaderValue::Deferred(_) => f.write_str("Deferred(..)"),
            HeaderValue::Structured(p) => f.debug_tuple("Structured").field(p).finish(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Text(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Text(s)
    }
}

impl From<Payload> for HeaderValue {
    fn from(p: Payload) -> Self {
        HeaderValue::Structured(p)
    }
}

impl From<Value> for HeaderValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => HeaderValue::Text(s),
            other => HeaderValue::Structured(Payload::from(other)),
        }
    }
}

/// Ordered header map. Names are matched exactly when setting or removing.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object of `name: value`.
    pub fn from_json(value: Value) -> Result<Self, RequestError> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            _ => Err(RequestError::InvalidArgument(
                "headers must be an object of name: value".to_string(),
            )),
        }
    }

    /// Insert or replace a header, keeping the original position on replace.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Copy every header of `other` over this map; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in &other.entries {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// True when a literal `Content-Type` header equals `mime`, ignoring case
    /// in both the header name and its value.
    pub fn content_type_is(&self, mime: &str) -> bool {
        self.entries.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case(CONTENT_TYPE)
                && value.literal().is_some_and(|v| v.eq_ignore_ascii_case(mime))
        })
    }

    /// Name/string pairs to apply to the transport, skipping empty values.
    pub fn resolve(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(n, v)| (n.clone(), v.resolve()))
            .collect()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

impl From<Map<String, Value>> for Headers {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Headers::from)
    }
}
