//! The transport capability consumed by requests.
//!
//! # Design
//! The crate never performs I/O itself. A `Transport` implementation opens a
//! connection, takes headers, and sends the prepared body; when the exchange
//! finishes it reports back through the `TransportEvents` it was handed.
//! The events object owns everything needed to decode and classify the
//! response, so a transport can move it to another thread and report from
//! there (asynchronous mode) or report before `send` returns (synchronous
//! mode).
//!
//! All request/response data uses owned types so values can be moved across
//! threads without lifetime concerns.

use std::fmt;
use std::sync::Arc;

use crate::error::{RequestFailure, TransportError};
use crate::multipart::MultipartForm;
use crate::payload::Blob;
use crate::response::{classify, Unserializer};
use crate::serializer::SerializerRegistry;
use crate::signal::Completer;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prepared request body.
#[derive(Debug, Clone, PartialEq)]
pub enum WireBody {
    Text(String),
    Binary(Blob),
    Form(MultipartForm),
}

impl WireBody {
    /// Body bytes as they go on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            WireBody::Text(text) => text.as_bytes().to_vec(),
            WireBody::Binary(blob) => blob.data().to_vec(),
            WireBody::Form(form) => form.to_bytes(),
        }
    }

    /// Content type implied by the body itself, if any.
    pub fn implied_content_type(&self) -> Option<String> {
        match self {
            WireBody::Form(form) => Some(form.content_type()),
            WireBody::Binary(blob) => blob.mime().map(str::to_string),
            WireBody::Text(_) => None,
        }
    }
}

/// A completed exchange as reported by the transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// A connection-like object that performs one request.
pub trait Transport {
    fn open(&mut self, method: Method, url: &str, is_async: bool) -> Result<(), TransportError>;

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// Send the body. The transport must eventually call exactly one of
    /// [`TransportEvents::complete`] or [`TransportEvents::error`]; in
    /// synchronous mode it does so before returning.
    fn send(&mut self, body: Option<WireBody>, events: TransportEvents) -> Result<(), TransportError>;
}

type ProgressFn = dyn Fn(f64) + Send + Sync;

/// Callback receiving upload progress as a percentage in `0.0..=100.0`.
#[derive(Clone)]
pub struct ProgressCallback(Arc<ProgressFn>);

impl ProgressCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressCallback(..)")
    }
}

/// Event sink handed to a transport for one request.
#[derive(Debug, Clone)]
pub struct TransportEvents {
    completer: Completer,
    serializers: Arc<SerializerRegistry>,
    unserializer: Unserializer,
    check_status: bool,
    progress: Option<ProgressCallback>,
}

impl TransportEvents {
    pub(crate) fn new(
        completer: Completer,
        serializers: Arc<SerializerRegistry>,
        unserializer: Unserializer,
        check_status: bool,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            completer,
            serializers,
            unserializer,
            check_status,
            progress,
        }
    }

    /// Report a finished exchange. Returns `false` if the request had
    /// already settled.
    pub fn complete(&self, response: TransportResponse) -> bool {
        if self.completer.is_settled() {
            tracing::warn!(status = response.status, "completion after settlement ignored");
            return false;
        }
        tracing::debug!(status = response.status, bytes = response.body.len(), "response received");
        let outcome = classify(
            &response,
            &self.unserializer,
            &self.serializers,
            self.check_status,
        );
        self.completer.settle(outcome)
    }

    /// Report a response whose body could not be read as text. Settles as a
    /// decode failure carrying `raw`.
    pub fn malformed(&self, message: impl Into<String>, raw: String) -> bool {
        let message = message.into();
        tracing::debug!(%message, "malformed response body");
        self.completer.settle(Err(RequestFailure::Decode { message, raw }))
    }

    /// Report a transport-level failure. Decoding is skipped entirely.
    pub fn error(&self, error: TransportError) -> bool {
        self.completer.settle(Err(RequestFailure::Transport(error)))
    }

    /// Report upload progress. Ignored when the total is unknown.
    pub fn upload_progress(&self, loaded: u64, total: u64) {
        if total == 0 {
            return;
        }
        if let Some(ProgressCallback(f)) = &self.progress {
            f(loaded as f64 / total as f64 * 100.0);
        }
    }

    pub fn is_settled(&self) -> bool {
        self.completer.is_settled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::channel;
    use parking_lot::Mutex;

    fn events(progress: Option<ProgressCallback>) -> (TransportEvents, crate::signal::CompletionSignal) {
        let (completer, signal) = channel();
        let events = TransportEvents::new(
            completer,
            Arc::new(SerializerRegistry::new()),
            Unserializer::default(),
            true,
            progress,
        );
        (events, signal)
    }

    fn ok_response() -> TransportResponse {
        TransportResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"status":"success"}"#.to_string(),
        }
    }

    #[test]
    fn complete_classifies_and_settles() {
        let (events, signal) = events(None);
        assert!(events.complete(ok_response()));
        assert!(signal.wait().is_ok());
    }

    #[test]
    fn error_bypasses_decoding() {
        let (events, signal) = events(None);
        assert!(events.error(TransportError::new("connection reset")));
        let err = signal.wait().unwrap_err();
        assert!(matches!(err, RequestFailure::Transport(_)));
        assert!(err.raw().is_none());
    }

    #[test]
    fn malformed_settles_as_decode_failure() {
        let (events, signal) = events(None);
        assert!(events.malformed("not text", "ab\u{fffd}".to_string()));
        let err = signal.wait().unwrap_err();
        assert!(matches!(err, RequestFailure::Decode { .. }));
        assert_eq!(err.message(), "not text");
        assert_eq!(err.raw(), Some("ab\u{fffd}"));
    }

    #[test]
    fn only_first_event_counts() {
        let (events, signal) = events(None);
        assert!(events.error(TransportError::new("boom")));
        assert!(!events.complete(ok_response()));
        assert!(signal.wait().is_err());
    }

    #[test]
    fn progress_reports_percentage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (events, _signal) = events(Some(ProgressCallback::new(move |p| sink.lock().push(p))));
        events.upload_progress(25, 100);
        events.upload_progress(5, 0);
        events.upload_progress(100, 100);
        assert_eq!(*seen.lock(), vec![25.0, 100.0]);
    }

    #[test]
    fn wire_body_bytes_and_content_type() {
        let text = WireBody::Text("a=1".to_string());
        assert_eq!(text.to_bytes(), b"a=1".to_vec());
        assert!(text.implied_content_type().is_none());

        let blob = WireBody::Binary(Blob::new(vec![7u8]).with_mime("image/png"));
        assert_eq!(blob.implied_content_type().as_deref(), Some("image/png"));

        let form = WireBody::Form(MultipartForm::with_boundary("b", Vec::new()));
        assert_eq!(
            form.implied_content_type().as_deref(),
            Some("multipart/form-data; boundary=b")
        );
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
