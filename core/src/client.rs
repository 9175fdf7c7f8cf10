//! Owner of the registries shared by every request.
//!
//! # Design
//! `Client` carries no per-request state. It holds the serializer registry
//! and the header preset table behind `Arc`s and hands clones of both to
//! each `Request` it creates, so entries registered once are visible to all
//! later requests of the same client. Cloning a client shares its
//! registries; `Client::new` always starts from fresh ones.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{CodecError, RequestError};
use crate::headers::Headers;
use crate::options::Options;
use crate::payload::Payload;
use crate::preset::PresetTable;
use crate::request::Request;
use crate::serializer::SerializerRegistry;
use crate::transport::Transport;

#[derive(Debug, Clone, Default)]
pub struct Client {
    serializers: Arc<SerializerRegistry>,
    presets: Arc<PresetTable>,
}

impl Client {
    /// A client with a `json`-only serializer registry and no presets.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registries(serializers: Arc<SerializerRegistry>, presets: Arc<PresetTable>) -> Self {
        Self {
            serializers,
            presets,
        }
    }

    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    pub fn register_serializer<E, D>(&self, name: &str, encode: E, decode: D) -> Result<(), RequestError>
    where
        E: Fn(&Value) -> Result<String, CodecError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        self.serializers.register(name, encode, decode)
    }

    pub fn define_preset(&self, name: impl Into<String>, headers: Headers) {
        self.presets.define(name, headers);
    }

    pub fn clear_preset(&self, name: &str) {
        self.presets.clear(name);
    }

    /// Start a request to `url` with no data and default options.
    pub fn request<T: Transport>(&self, transport: T, url: &str) -> Result<Request<T>, RequestError> {
        self.request_with(transport, url, None, Options::default())
    }

    pub fn request_with<T: Transport>(
        &self,
        transport: T,
        url: &str,
        data: Option<Payload>,
        options: Options,
    ) -> Result<Request<T>, RequestError> {
        Request::new(
            transport,
            url,
            data,
            options,
            self.serializers.clone(),
            self.presets.clone(),
        )
    }

    /// Like [`Client::request_with`], with options given as a JSON object.
    pub fn request_with_json<T: Transport>(
        &self,
        transport: T,
        url: &str,
        data: Option<Payload>,
        options: Value,
    ) -> Result<Request<T>, RequestError> {
        self.request_with(transport, url, data, Options::from_json(options)?)
    }
}
