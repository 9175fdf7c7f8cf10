//! A single configurable request.
//!
//! # Design
//! `Request` is edited through consuming fluent methods and dispatched by
//! `get`, `post` or `delete`, which take `self`: once a request is on its
//! way its configuration can no longer change. Dispatch does all fallible,
//! synchronous work first (preset lookup, serializer lookup, body encoding)
//! and returns those failures directly. Only then does it touch the
//! transport; from that point every failure is delivered through the
//! returned `CompletionSignal`.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{RequestError, TransportError};
use crate::flatten::query_string;
use crate::headers::{HeaderValue, Headers, ACCEPT, CONTENT_TYPE, JSON_MIME, URL_ENCODED_MIME};
use crate::options::Options;
use crate::payload::Payload;
use crate::prepare::Preparer;
use crate::preset::PresetTable;
use crate::response::Unserializer;
use crate::serializer::SerializerRegistry;
use crate::signal::{channel, CompletionSignal};
use crate::transport::{Method, ProgressCallback, Transport, TransportEvents, WireBody};

#[derive(Debug)]
pub struct Request<T> {
    transport: T,
    url: String,
    data: Option<Payload>,
    options: Options,
    progress: Option<ProgressCallback>,
    serializers: Arc<SerializerRegistry>,
    presets: Arc<PresetTable>,
}

impl<T: Transport> Request<T> {
    pub(crate) fn new(
        transport: T,
        url: &str,
        data: Option<Payload>,
        options: Options,
        serializers: Arc<SerializerRegistry>,
        presets: Arc<PresetTable>,
    ) -> Result<Self, RequestError> {
        if url.trim().is_empty() {
            return Err(RequestError::InvalidUrl);
        }
        Ok(Self {
            transport,
            url: url.to_string(),
            data,
            options,
            progress: None,
            serializers,
            presets,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Merge `headers` over the current headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.options.headers.merge(&headers);
        self
    }

    /// Merge a JSON object of `name: value` over the current headers.
    pub fn try_headers(self, headers: Value) -> Result<Self, RequestError> {
        Ok(self.headers(Headers::from_json(headers)?))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.options.headers.set(name, value);
        self
    }

    pub fn remove_header(mut self, name: &str) -> Self {
        self.options.headers.remove(name);
        self
    }

    /// `Content-Type` and `Accept` set to `application/json`.
    pub fn json_headers(self) -> Self {
        self.header(CONTENT_TYPE, JSON_MIME).header(ACCEPT, JSON_MIME)
    }

    pub fn url_encoded_headers(self) -> Self {
        self.header(CONTENT_TYPE, URL_ENCODED_MIME)
    }

    /// Merge the named preset into the headers when the request is sent.
    pub fn use_preset(mut self, name: impl Into<String>) -> Result<Self, RequestError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RequestError::InvalidArgument(
                "preset name must not be empty".to_string(),
            ));
        }
        self.options.headers_preset = Some(name);
        Ok(self)
    }

    /// Always encode composite data as a multipart form.
    pub fn send_form(mut self) -> Self {
        self.options.send_form = true;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.options.is_async = true;
        self
    }

    pub fn synchronous(mut self) -> Self {
        self.options.is_async = false;
        self
    }

    pub fn unserializer(mut self, unserializer: Unserializer) -> Self {
        self.options.unserializer = unserializer;
        self
    }

    pub fn check_status(mut self, enabled: bool) -> Self {
        self.options.check_status = enabled;
        self
    }

    pub fn url_encoded_bodies(mut self, enabled: bool) -> Self {
        self.options.url_encoded_bodies = enabled;
        self
    }

    /// Receive upload progress as a percentage.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.progress = Some(ProgressCallback::new(f));
        self
    }

    /// Send `data` as a query string and the request without a body.
    pub fn get(self) -> Result<CompletionSignal, RequestError> {
        let url = self.url_with_query();
        self.dispatch(Method::Get, url, false)
    }

    pub fn delete(self) -> Result<CompletionSignal, RequestError> {
        let url = self.url_with_query();
        self.dispatch(Method::Delete, url, false)
    }

    /// Send `data` as the prepared body.
    pub fn post(self) -> Result<CompletionSignal, RequestError> {
        let url = self.url.clone();
        self.dispatch(Method::Post, url, true)
    }

    fn url_with_query(&self) -> String {
        let Some(data) = self.data.as_ref().filter(|d| !matches!(d, Payload::Null)) else {
            return self.url.clone();
        };
        let query = query_string(data);
        if query.is_empty() {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.url)
    }

    /// Request headers with the configured preset merged over them.
    fn effective_headers(&self) -> Result<Headers, RequestError> {
        let mut headers = self.options.headers.clone();
        if let Some(name) = &self.options.headers_preset {
            let preset = self.presets.get(name)?;
            tracing::debug!(preset = %name, headers = preset.len(), "merging header preset");
            headers.merge(&preset);
        }
        Ok(headers)
    }

    fn dispatch(
        mut self,
        method: Method,
        url: String,
        with_body: bool,
    ) -> Result<CompletionSignal, RequestError> {
        let headers = self.effective_headers()?;
        if let Unserializer::Named(name) = &self.options.unserializer {
            self.serializers.lookup(name)?;
        }
        let body = if with_body {
            Preparer {
                headers: &headers,
                send_form: self.options.send_form,
                url_encoded_bodies: self.options.url_encoded_bodies,
                serializers: &self.serializers,
            }
            .prepare(self.data.as_ref())?
        } else {
            None
        };

        let (completer, signal) = channel();
        let events = TransportEvents::new(
            completer,
            self.serializers.clone(),
            self.options.unserializer.clone(),
            self.options.check_status,
            self.progress.take(),
        );

        tracing::debug!(%method, %url, is_async = self.options.is_async, "dispatching request");
        if let Err(e) = self.start(method, &url, &headers, body, events.clone()) {
            tracing::debug!(error = %e, "transport refused request");
            events.error(e);
        }
        Ok(signal)
    }

    fn start(
        &mut self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<WireBody>,
        events: TransportEvents,
    ) -> Result<(), TransportError> {
        self.transport.open(method, url, self.options.is_async)?;
        for (name, value) in headers.resolve() {
            self.transport.set_header(&name, &value)?;
        }
        self.transport.send(body, events)
    }
}
