//! Client-side HTTP request core with content-negotiated payloads.
//!
//! # Overview
//! Prepares request bodies according to the declared content type (JSON
//! text, URL-encoded query string, or multipart form), hands them to a
//! pluggable `Transport`, and settles a one-shot `CompletionSignal` from the
//! response. Responses are decoded through a named serializer registry and,
//! by default, must carry `"status": "success"` to count as a success.
//!
//! # Design
//! - The crate performs no I/O of its own; a `Transport` does (host-does-IO).
//!   `UreqTransport` (feature `ureq`) and `ScriptedTransport` are provided.
//! - `Client` owns the serializer registry and the header preset table and
//!   shares them with every request it creates.
//! - Synchronous failures (bad arguments, unknown names, unencodable data)
//!   are returned as `RequestError`; everything after dispatch arrives as a
//!   `RequestFailure` through the signal.

pub mod client;
pub mod error;
pub mod flatten;
pub mod headers;
pub mod multipart;
pub mod options;
pub mod payload;
pub mod prepare;
pub mod preset;
pub mod request;
pub mod response;
pub mod scripted;
pub mod serializer;
pub mod signal;
pub mod transport;
#[cfg(feature = "ureq")]
pub mod ureq_transport;

pub use client::Client;
pub use error::{CodecError, RequestError, RequestFailure, TransportError};
pub use flatten::{form_entries, query_string, FormEntry, FormValue};
pub use headers::{HeaderValue, Headers};
pub use multipart::MultipartForm;
pub use options::Options;
pub use payload::{Blob, Payload};
pub use preset::PresetTable;
pub use request::Request;
pub use response::{Success, Unserializer};
pub use scripted::{Recorded, ScriptedHandle, ScriptedTransport};
pub use serializer::{Serializer, SerializerRegistry};
pub use signal::{CompletionSignal, Completer, Outcome};
pub use transport::{Method, Transport, TransportEvents, TransportResponse, WireBody};
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;
