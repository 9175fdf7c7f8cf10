//! Response decoding and success/failure classification.
//!
//! # Design
//! Classification is a pure function of the transport response and the
//! request's configuration: decode the body with the configured
//! unserializer, then (optionally) insist on `{"status": "success"}` in the
//! decoded value. The result is what the completion signal settles with; it
//! never retries and never touches configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CodecError, RequestFailure};
use crate::serializer::{SerializerRegistry, JSON};
use crate::transport::TransportResponse;

/// Message used when a rejected body carries no `message` field.
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response";

/// Value of the `status` field marking a successful application response.
pub const SUCCESS_STATUS: &str = "success";

type CustomFn = dyn Fn(&TransportResponse, &str) -> Result<Value, CodecError> + Send + Sync;

/// How the raw response text becomes a value.
#[derive(Clone)]
pub enum Unserializer {
    /// Decode with the serializer registered under this name.
    Named(String),
    /// Decode with a caller-supplied function that also sees the response.
    Custom(Arc<CustomFn>),
    /// Keep the raw text as a JSON string.
    Raw,
}

impl Unserializer {
    pub fn named(name: impl Into<String>) -> Self {
        Unserializer::Named(name.into())
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&TransportResponse, &str) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        Unserializer::Custom(Arc::new(f))
    }

    fn decode(
        &self,
        response: &TransportResponse,
        serializers: &SerializerRegistry,
    ) -> Result<Value, CodecError> {
        match self {
            Unserializer::Named(name) => serializers
                .lookup(name)
                .map_err(|e| CodecError::new(e.to_string()))?
                .decode(&response.body),
            Unserializer::Custom(f) => f(response, &response.body),
            Unserializer::Raw => Ok(Value::String(response.body.clone())),
        }
    }
}

impl Default for Unserializer {
    fn default() -> Self {
        Unserializer::Named(JSON.to_string())
    }
}

impl fmt::Debug for Unserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unserializer::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Unserializer::Custom(_) => f.write_str("Custom(..)"),
            Unserializer::Raw => f.write_str("Raw"),
        }
    }
}

impl<'de> Deserialize<'de> for Unserializer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(name) => Unserializer::Named(name),
            None => Unserializer::Raw,
        })
    }
}

/// A successfully settled request.
#[derive(Debug, Clone, PartialEq)]
pub struct Success {
    pub data: Value,
    pub raw: String,
}

/// Decode and classify a completed response.
pub fn classify(
    response: &TransportResponse,
    unserializer: &Unserializer,
    serializers: &SerializerRegistry,
    check_status: bool,
) -> Result<Success, RequestFailure> {
    let raw = response.body.clone();
    let data = unserializer
        .decode(response, serializers)
        .map_err(|e| RequestFailure::Decode {
            message: e.message().to_string(),
            raw: raw.clone(),
        })?;

    if check_status && data.get("status").and_then(Value::as_str) != Some(SUCCESS_STATUS) {
        let message = match data.get("message") {
            Some(Value::String(m)) => m.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => UNEXPECTED_RESPONSE.to_string(),
        };
        return Err(RequestFailure::Rejected { message, data, raw });
    }

    Ok(Success { data, raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: &str) -> TransportResponse {
        TransportResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn json_checked(body: &str) -> Result<Success, RequestFailure> {
        classify(&response(body), &Unserializer::default(), &SerializerRegistry::new(), true)
    }

    #[test]
    fn success_status_resolves_with_data_and_raw() {
        let body = r#"{"status":"success","data":42}"#;
        let ok = json_checked(body).unwrap();
        assert_eq!(ok.data, json!({"status": "success", "data": 42}));
        assert_eq!(ok.raw, body);
    }

    #[test]
    fn error_status_uses_message() {
        let err = json_checked(r#"{"status":"error","message":"bad input"}"#).unwrap_err();
        assert_eq!(err.message(), "bad input");
        assert_eq!(err.data().unwrap()["status"], "error");
    }

    #[test]
    fn missing_status_uses_generic_message() {
        let err = json_checked(r#"{"data":1}"#).unwrap_err();
        assert_eq!(err.message(), UNEXPECTED_RESPONSE);
        assert_eq!(err.raw(), Some(r#"{"data":1}"#));
    }

    #[test]
    fn non_string_status_is_rejected() {
        let err = json_checked(r#"{"status":true}"#).unwrap_err();
        assert!(matches!(err, RequestFailure::Rejected { .. }));
    }

    #[test]
    fn malformed_json_is_a_decode_failure() {
        let err = json_checked("<html>oops</html>").unwrap_err();
        assert!(matches!(err, RequestFailure::Decode { .. }));
        assert!(err.data().is_none());
        assert!(!err.message().is_empty());
    }

    #[test]
    fn unchecked_status_accepts_any_decoded_body() {
        let ok = classify(
            &response(r#"{"status":"error"}"#),
            &Unserializer::default(),
            &SerializerRegistry::new(),
            false,
        )
        .unwrap();
        assert_eq!(ok.data["status"], "error");
    }

    #[test]
    fn unknown_serializer_is_a_decode_failure() {
        let err = classify(
            &response("{}"),
            &Unserializer::named("yaml"),
            &SerializerRegistry::new(),
            false,
        )
        .unwrap_err();
        assert_eq!(err.message(), "serializer `yaml` not found");
    }

    #[test]
    fn custom_unserializer_sees_response() {
        let unserializer = Unserializer::custom(|resp, raw| {
            Ok(json!({"status": "success", "code": resp.status, "len": raw.len()}))
        });
        let ok = classify(&response("abc"), &unserializer, &SerializerRegistry::new(), true)
            .unwrap();
        assert_eq!(ok.data["code"], 200);
        assert_eq!(ok.data["len"], 3);
    }

    #[test]
    fn custom_unserializer_errors_become_decode_failures() {
        let unserializer = Unserializer::custom(|_, _| Err(CodecError::new("nope")));
        let err = classify(&response("x"), &unserializer, &SerializerRegistry::new(), false)
            .unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn raw_unserializer_keeps_text() {
        let ok = classify(&response("plain"), &Unserializer::Raw, &SerializerRegistry::new(), false)
            .unwrap();
        assert_eq!(ok.data, json!("plain"));
    }

    #[test]
    fn unserializer_deserializes_from_name_or_null() {
        let named: Unserializer = serde_json::from_value(json!("json")).unwrap();
        assert!(matches!(named, Unserializer::Named(n) if n == "json"));
        let raw: Unserializer = serde_json::from_value(json!(null)).unwrap();
        assert!(matches!(raw, Unserializer::Raw));
    }
}
