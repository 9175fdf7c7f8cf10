//! Error types for the request pipeline.
//!
//! # Design
//! Failures are split by *when* they can be known. Anything detectable
//! before the transport starts its round-trip (bad arguments, unknown
//! serializer or preset names, payloads that cannot be encoded) is a
//! `RequestError` returned synchronously from the call that caused it.
//! Anything that can only be known after the round-trip begins is a
//! `RequestFailure` delivered through the `CompletionSignal`, so callers
//! never need to handle both on the asynchronous path.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced synchronously while building or dispatching a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request URL is empty or blank.
    #[error("url must be a non-empty string")]
    InvalidUrl,

    /// The options value is neither an object nor an array.
    #[error("options must be an object: {0}")]
    InvalidOptions(String),

    /// A fluent setter or registry call received an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No serializer is registered under the requested name.
    #[error("serializer `{0}` not found")]
    SerializerNotFound(String),

    /// The configured header preset has not been defined.
    #[error("header preset `{0}` is not defined")]
    PresetNotFound(String),

    /// The request payload could not be encoded for the wire.
    #[error("payload encoding failed: {0}")]
    Encode(#[source] CodecError),
}

/// Failure reported by a serializer's encode or decode function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Opaque error raised by a transport implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying I/O or client error, keeping it as the source.
    pub fn from_source<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a request settled when it did not succeed.
#[derive(Debug, Error)]
pub enum RequestFailure {
    /// The response body could not be decoded by the selected unserializer.
    #[error("{message}")]
    Decode { message: String, raw: String },

    /// The body decoded, but its `status` field was not `"success"`.
    #[error("{message}")]
    Rejected {
        message: String,
        data: Value,
        raw: String,
    },

    /// The transport failed before a response was received.
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    /// The completion side went away without ever settling.
    #[error("request was abandoned before it completed")]
    Abandoned,
}

impl RequestFailure {
    /// Human-readable failure message.
    pub fn message(&self) -> String {
        match self {
            RequestFailure::Decode { message, .. } | RequestFailure::Rejected { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// Decoded response data, when decoding got that far.
    pub fn data(&self) -> Option<&Value> {
        match self {
            RequestFailure::Rejected { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Raw response text, when a response was received.
    pub fn raw(&self) -> Option<&str> {
        match self {
            RequestFailure::Decode { raw, .. } | RequestFailure::Rejected { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Convenience label used in log fields.
pub(crate) struct FailureKind<'a>(pub &'a RequestFailure);

impl fmt::Display for FailureKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.0 {
            RequestFailure::Decode { .. } => "decode",
            RequestFailure::Rejected { .. } => "rejected",
            RequestFailure::Transport(_) => "transport",
            RequestFailure::Abandoned => "abandoned",
        };
        f.write_str(label)
    }
}
