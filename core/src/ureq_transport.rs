//! Blocking HTTP transport backed by `ureq`.
//!
//! In synchronous mode the exchange runs inside `send`, so the signal is
//! already settled when `send` returns. In asynchronous mode it runs on a
//! spawned thread and reports through the moved `TransportEvents`.
//!
//! Non-2xx statuses are delivered as responses rather than errors; the
//! application-level status field decides success.

use std::fmt;

use ureq::{Agent, RequestBuilder};

use crate::error::TransportError;
use crate::headers::CONTENT_TYPE;
use crate::transport::{Method, Transport, TransportEvents, TransportResponse, WireBody};

#[derive(Debug, Clone)]
struct Opened {
    method: Method,
    url: String,
    is_async: bool,
    headers: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    opened: Option<Opened>,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("opened", &self.opened)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Use a preconfigured agent. It should not treat HTTP statuses as errors.
    pub fn with_agent(agent: Agent) -> Self {
        Self {
            agent,
            opened: None,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn open(&mut self, method: Method, url: &str, is_async: bool) -> Result<(), TransportError> {
        self.opened = Some(Opened {
            method,
            url: url.to_string(),
            is_async,
            headers: Vec::new(),
        });
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let opened = self
            .opened
            .as_mut()
            .ok_or_else(|| TransportError::new("set_header called before open"))?;
        opened.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn send(&mut self, body: Option<WireBody>, events: TransportEvents) -> Result<(), TransportError> {
        let mut opened = self
            .opened
            .take()
            .ok_or_else(|| TransportError::new("send called before open"))?;
        apply_implied_content_type(&mut opened.headers, body.as_ref());

        let agent = self.agent.clone();
        if opened.is_async {
            std::thread::spawn(move || exchange(&agent, &opened, body, &events));
        } else {
            exchange(&agent, &opened, body, &events);
        }
        Ok(())
    }
}

fn apply_implied_content_type(headers: &mut Vec<(String, String)>, body: Option<&WireBody>) {
    let Some(body) = body else { return };
    let Some(implied) = body.implied_content_type() else {
        return;
    };
    let declared = headers
        .iter()
        .any(|(n, _)| n.eq_ignore_ascii_case(CONTENT_TYPE));
    match body {
        // The boundary is only known here, so a form always wins.
        WireBody::Form(_) => {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(CONTENT_TYPE));
            headers.push((CONTENT_TYPE.to_string(), implied));
        }
        _ if !declared => headers.push((CONTENT_TYPE.to_string(), implied)),
        _ => {}
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn exchange(agent: &Agent, opened: &Opened, body: Option<WireBody>, events: &TransportEvents) {
    tracing::debug!(method = %opened.method, url = %opened.url, "ureq exchange");
    match execute(agent, opened, body, events) {
        Ok(received) => match body_text(received.body) {
            Ok(body) => {
                events.complete(TransportResponse {
                    status: received.status,
                    headers: received.headers,
                    body,
                });
            }
            Err((message, raw)) => {
                events.malformed(message, raw);
            }
        },
        Err(e) => {
            events.error(TransportError::from_source(e));
        }
    }
}

struct Received {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

fn execute(
    agent: &Agent,
    opened: &Opened,
    body: Option<WireBody>,
    events: &TransportEvents,
) -> Result<Received, ureq::Error> {
    let bytes = body.map(|b| b.to_bytes());
    let url = opened.url.as_str();

    let mut response = match (opened.method, bytes.as_deref()) {
        (Method::Get, _) => with_headers(agent.get(url), &opened.headers).call(),
        (Method::Delete, _) => with_headers(agent.delete(url), &opened.headers).call(),
        (Method::Post, Some(bytes)) => with_headers(agent.post(url), &opened.headers).send(bytes),
        (Method::Post, None) => with_headers(agent.post(url), &opened.headers).send_empty(),
    }?;

    if let Some(bytes) = &bytes {
        let total = bytes.len() as u64;
        events.upload_progress(total, total);
    }

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    // No size cap: the whole body is handed to the unserializer anyway.
    let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;

    Ok(Received {
        status,
        headers,
        body,
    })
}

/// Response text, or a decode message plus lossy raw text for a body that
/// is not UTF-8.
fn body_text(bytes: Vec<u8>) -> Result<String, (String, String)> {
    String::from_utf8(bytes).map_err(|e| {
        let message = format!("response body is not valid UTF-8: {}", e.utf8_error());
        let raw = String::from_utf8_lossy(e.as_bytes()).into_owned();
        (message, raw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::MultipartForm;
    use crate::payload::Blob;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn form_replaces_declared_content_type() {
        let mut headers = pairs(&[("content-type", "application/json"), ("Accept", "*/*")]);
        let form = WireBody::Form(MultipartForm::with_boundary("zz", Vec::new()));
        apply_implied_content_type(&mut headers, Some(&form));
        assert_eq!(
            headers,
            pairs(&[
                ("Accept", "*/*"),
                ("Content-Type", "multipart/form-data; boundary=zz")
            ])
        );
    }

    #[test]
    fn blob_mime_only_fills_a_missing_content_type() {
        let blob = WireBody::Binary(Blob::new(vec![1u8]).with_mime("image/png"));

        let mut headers = Vec::new();
        apply_implied_content_type(&mut headers, Some(&blob));
        assert_eq!(headers, pairs(&[("Content-Type", "image/png")]));

        let mut headers = pairs(&[("Content-Type", "application/octet-stream")]);
        apply_implied_content_type(&mut headers, Some(&blob));
        assert_eq!(headers, pairs(&[("Content-Type", "application/octet-stream")]));
    }

    #[test]
    fn text_bodies_leave_headers_alone() {
        let mut headers = Vec::new();
        apply_implied_content_type(&mut headers, Some(&WireBody::Text("x".to_string())));
        apply_implied_content_type(&mut headers, None);
        assert!(headers.is_empty());
    }

    #[test]
    fn body_text_accepts_utf8() {
        assert_eq!(body_text("héllo".as_bytes().to_vec()).unwrap(), "héllo");
    }

    #[test]
    fn body_text_rejects_invalid_utf8() {
        let (message, raw) = body_text(vec![b'o', b'k', 0xff]).unwrap_err();
        assert!(message.contains("not valid UTF-8"), "{message}");
        assert_eq!(raw, "ok\u{fffd}");
    }

    #[test]
    fn set_header_requires_open() {
        let mut transport = UreqTransport::new();
        assert!(transport.set_header("A", "b").is_err());
        transport.open(Method::Get, "http://localhost", false).unwrap();
        assert!(transport.set_header("A", "b").is_ok());
    }
}
