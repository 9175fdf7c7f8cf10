//! In-memory transport that replays a scripted reply.
//!
//! Useful for exercising request handling without a network: every call is
//! recorded, and the reply is delivered from inside `send`. A held transport
//! never replies on its own; the test fires events through its handle.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::{Method, Transport, TransportEvents, TransportResponse, WireBody};

/// Everything a request did to the transport.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub is_async: Option<bool>,
    pub headers: Vec<(String, String)>,
    pub body: Option<WireBody>,
    pub sent: bool,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(TransportResponse),
    Fail(String),
    Hold,
}

#[derive(Debug, Default)]
struct Shared {
    recorded: Mutex<Recorded>,
    events: Mutex<Option<TransportEvents>>,
}

/// Inspection handle for a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct ScriptedHandle(Arc<Shared>);

impl ScriptedHandle {
    pub fn recorded(&self) -> Recorded {
        self.0.recorded.lock().clone()
    }

    /// Events captured by `send`, for firing completion by hand.
    pub fn events(&self) -> Option<TransportEvents> {
        self.0.events.lock().clone()
    }
}

#[derive(Debug)]
pub struct ScriptedTransport {
    reply: Reply,
    progress: Vec<(u64, u64)>,
    shared: Arc<Shared>,
}

impl ScriptedTransport {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            progress: Vec::new(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Reply with `status` and `body`.
    pub fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::with_reply(Reply::Respond(TransportResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }))
    }

    /// Fail at the transport level with `message`.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    /// Never reply; events are left on the handle.
    pub fn hold() -> Self {
        Self::with_reply(Reply::Hold)
    }

    /// Emit an upload progress event before replying.
    pub fn with_progress(mut self, loaded: u64, total: u64) -> Self {
        self.progress.push((loaded, total));
        self
    }

    pub fn handle(&self) -> ScriptedHandle {
        ScriptedHandle(self.shared.clone())
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self, method: Method, url: &str, is_async: bool) -> Result<(), TransportError> {
        let mut recorded = self.shared.recorded.lock();
        recorded.method = Some(method);
        recorded.url = Some(url.to_string());
        recorded.is_async = Some(is_async);
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        if self.shared.recorded.lock().method.is_none() {
            return Err(TransportError::new("set_header called before open"));
        }
        self.shared
            .recorded
            .lock()
            .headers
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn send(&mut self, body: Option<WireBody>, events: TransportEvents) -> Result<(), TransportError> {
        {
            let mut recorded = self.shared.recorded.lock();
            if recorded.method.is_none() {
                return Err(TransportError::new("send called before open"));
            }
            recorded.body = body;
            recorded.sent = true;
        }
        *self.shared.events.lock() = Some(events.clone());

        for (loaded, total) in &self.progress {
            events.upload_progress(*loaded, *total);
        }
        match &self.reply {
            Reply::Respond(response) => {
                events.complete(response.clone());
            }
            Reply::Fail(message) => {
                events.error(TransportError::new(message.clone()));
            }
            Reply::Hold => {}
        }
        Ok(())
    }
}
