//! Named, reusable header sets.
//!
//! Like the serializer registry, the table is owned by a `Client` and shared
//! with its requests. A request that names a preset looks it up at send time
//! and merges it over its own headers.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::RequestError;
use crate::headers::Headers;

#[derive(Debug, Default)]
pub struct PresetTable {
    presets: RwLock<HashMap<String, Headers>>,
}

impl PresetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace the preset `name`.
    pub fn define(&self, name: impl Into<String>, headers: Headers) {
        let name = name.into();
        tracing::debug!(preset = %name, headers = headers.len(), "defined header preset");
        self.presets.write().insert(name, headers);
    }

    /// Remove the preset `name`. Removing an unknown preset does nothing.
    pub fn clear(&self, name: &str) {
        self.presets.write().remove(name);
    }

    pub fn get(&self, name: &str) -> Result<Headers, RequestError> {
        self.presets
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RequestError::PresetNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.read().contains_key(name)
    }
}
