//! Per-request configuration.
//!
//! # Design
//! `Options` starts from fixed defaults and is edited through the fluent
//! methods on `Request` until the request is dispatched, which consumes it.
//! It can also be loaded from a JSON object whose keys follow the
//! camel-cased names used by browser-side callers (`headersPreset`,
//! `sendForm`, `responseUnserializer`, `checkResponseDataStatus`, ...).

use serde::Deserialize;
use serde_json::Value;

use crate::error::RequestError;
use crate::headers::Headers;
use crate::response::Unserializer;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub headers: Headers,
    pub headers_preset: Option<String>,
    /// Deliver completion later instead of inside `send`.
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Always send composite data as a multipart form.
    pub send_form: bool,
    #[serde(rename = "responseUnserializer")]
    pub unserializer: Unserializer,
    /// Require `"status": "success"` in decoded responses.
    #[serde(rename = "checkResponseDataStatus")]
    pub check_status: bool,
    /// Query-serialize composite bodies when the content type is
    /// `application/x-www-form-urlencoded`. When off, such bodies fall
    /// through to pass-through encoding.
    pub url_encoded_bodies: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            headers: Headers::new(),
            headers_preset: None,
            is_async: true,
            send_form: false,
            unserializer: Unserializer::default(),
            check_status: true,
            url_encoded_bodies: true,
        }
    }
}

impl Options {
    /// Merge a JSON object over the defaults.
    ///
    /// An array yields the defaults unchanged; any other value is rejected.
    pub fn from_json(value: Value) -> Result<Self, RequestError> {
        match value {
            Value::Object(_) => {
                serde_json::from_value(value).map_err(|e| RequestError::InvalidOptions(e.to_string()))
            }
            Value::Array(_) => Ok(Self::default()),
            other => Err(RequestError::InvalidOptions(format!(
                "expected an object, got `{other}`"
            ))),
        }
    }
}
