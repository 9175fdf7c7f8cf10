//! Named encode/decode pairs shared by every request of a client.
//!
//! # Design
//! The registry is an explicitly owned object rather than global state. A
//! `Client` holds it behind an `Arc`, so "register once, reuse across
//! requests" still holds, but two clients never see each other's entries.
//! Registering an existing name replaces the previous pair (last write
//! wins); callers should register during start-up rather than per request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{CodecError, RequestError};

/// Name of the serializer every registry starts with.
pub const JSON: &str = "json";

pub type EncodeFn = dyn Fn(&Value) -> Result<String, CodecError> + Send + Sync;
pub type DecodeFn = dyn Fn(&str) -> Result<Value, CodecError> + Send + Sync;

/// A pair of pure functions converting between values and text.
#[derive(Clone)]
pub struct Serializer {
    encode: Arc<EncodeFn>,
    decode: Arc<DecodeFn>,
}

impl Serializer {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&Value) -> Result<String, CodecError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Structural JSON text.
    pub fn json() -> Self {
        Self::new(
            |value| serde_json::to_string(value).map_err(CodecError::from),
            |text| serde_json::from_str(text).map_err(CodecError::from),
        )
    }

    pub fn encode(&self, value: &Value) -> Result<String, CodecError> {
        (self.encode)(value)
    }

    pub fn decode(&self, text: &str) -> Result<Value, CodecError> {
        (self.decode)(text)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer").finish_non_exhaustive()
    }
}

/// Thread-safe table of serializers keyed by name.
#[derive(Debug)]
pub struct SerializerRegistry {
    entries: RwLock<HashMap<String, Serializer>>,
}

impl SerializerRegistry {
    /// A registry holding only the `json` serializer.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(JSON.to_string(), Serializer::json());
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// A registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `encode`/`decode` under `name`, replacing any previous pair.
    pub fn register<E, D>(&self, name: &str, encode: E, decode: D) -> Result<(), RequestError>
    where
        E: Fn(&Value) -> Result<String, CodecError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        self.insert(name, Serializer::new(encode, decode))
    }

    /// Register a prebuilt serializer under `name`.
    pub fn insert(&self, name: &str, serializer: Serializer) -> Result<(), RequestError> {
        if name.trim().is_empty() {
            return Err(RequestError::InvalidArgument(
                "serializer name must not be empty".to_string(),
            ));
        }
        if self
            .entries
            .write()
            .insert(name.to_string(), serializer)
            .is_some()
        {
            tracing::debug!(name, "replaced serializer");
        }
        Ok(())
    }

    /// Fetch the serializer registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<Serializer, RequestError> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RequestError::SerializerNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
