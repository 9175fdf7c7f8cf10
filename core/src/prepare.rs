//! Choosing and applying the body encoding for outgoing data.
//!
//! # Design
//! Exactly one strategy applies, tested in this order:
//! 1. forced form mode: composite data becomes a multipart form;
//! 2. a JSON content type: composite data becomes JSON text;
//! 3. a URL-encoded content type (only when `url_encoded_bodies` is on):
//!    composite data becomes a query string;
//! 4. otherwise the data passes through.
//!
//! In every branch a scalar passes through as its string form. Passing a
//! composite value through still needs *some* wire form, so it is encoded
//! with the registry's `json` serializer; a bare blob is sent as binary.

use std::fmt;

use crate::error::RequestError;
use crate::flatten::{form_entries, query_string};
use crate::headers::{Headers, JSON_MIME, URL_ENCODED_MIME};
use crate::multipart::MultipartForm;
use crate::payload::Payload;
use crate::serializer::{SerializerRegistry, JSON};
use crate::transport::WireBody;

/// The encoding branch selected for a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Form,
    Json,
    UrlEncoded,
    PassThrough,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Form => "form",
            Strategy::Json => "json",
            Strategy::UrlEncoded => "url-encoded",
            Strategy::PassThrough => "pass-through",
        };
        f.write_str(name)
    }
}

/// Body preparation for one request, reading the request's settled headers.
#[derive(Debug, Clone, Copy)]
pub struct Preparer<'a> {
    pub headers: &'a Headers,
    pub send_form: bool,
    pub url_encoded_bodies: bool,
    pub serializers: &'a SerializerRegistry,
}

impl Preparer<'_> {
    pub fn strategy(&self) -> Strategy {
        if self.send_form {
            Strategy::Form
        } else if self.headers.content_type_is(JSON_MIME) {
            Strategy::Json
        } else if self.url_encoded_bodies && self.headers.content_type_is(URL_ENCODED_MIME) {
            Strategy::UrlEncoded
        } else {
            Strategy::PassThrough
        }
    }

    /// Encode `data` for the wire. `None` means "no body".
    pub fn prepare(&self, data: Option<&Payload>) -> Result<Option<WireBody>, RequestError> {
        let Some(data) = data else {
            return Ok(None);
        };
        let strategy = self.strategy();
        tracing::debug!(%strategy, composite = data.is_composite(), "preparing request body");

        if !data.is_composite() {
            return Ok(scalar_body(data));
        }
        let body = match strategy {
            Strategy::Form => WireBody::Form(MultipartForm::new(form_entries(data))),
            Strategy::Json => WireBody::Text(self.json(data)?),
            Strategy::UrlEncoded => WireBody::Text(query_string(data)),
            Strategy::PassThrough => match data {
                Payload::Blob(blob) => WireBody::Binary(blob.clone()),
                other => WireBody::Text(self.json(other)?),
            },
        };
        Ok(Some(body))
    }

    fn json(&self, data: &Payload) -> Result<String, RequestError> {
        let value = data.to_json().map_err(RequestError::Encode)?;
        self.serializers
            .lookup(JSON)?
            .encode(&value)
            .map_err(RequestError::Encode)
    }
}

fn scalar_body(data: &Payload) -> Option<WireBody> {
    match data {
        Payload::Null => None,
        scalar => scalar.scalar_text().map(WireBody::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FormValue;
    use crate::payload::Blob;
    use serde_json::json;

    fn headers(content_type: &str) -> Headers {
        [("Content-Type", content_type)].into_iter().collect()
    }

    fn preparer<'a>(
        headers: &'a Headers,
        registry: &'a SerializerRegistry,
        send_form: bool,
        url_encoded_bodies: bool,
    ) -> Preparer<'a> {
        Preparer {
            headers,
            send_form,
            url_encoded_bodies,
            serializers: registry,
        }
    }

    fn text(body: Option<WireBody>) -> String {
        match body {
            Some(WireBody::Text(t)) => t,
            other => panic!("expected text body, got {other:?}"),
        }
    }

    #[test]
    fn missing_data_means_no_body() {
        let h = Headers::new();
        let r = SerializerRegistry::new();
        assert!(preparer(&h, &r, true, true).prepare(None).unwrap().is_none());
    }

    #[test]
    fn form_mode_flattens_composites() {
        let h = headers(JSON_MIME);
        let r = SerializerRegistry::new();
        let data = Payload::object([("a", Payload::from("1")), ("f", Blob::new(vec![1u8]).into())]);
        let p = preparer(&h, &r, true, true);
        assert_eq!(p.strategy(), Strategy::Form);
        match p.prepare(Some(&data)).unwrap() {
            Some(WireBody::Form(form)) => {
                assert_eq!(form.entries().len(), 2);
                assert!(matches!(form.entries()[1].value, FormValue::Blob(_)));
            }
            other => panic!("expected form, got {other:?}"),
        }
    }

    #[test]
    fn form_mode_passes_scalars_through() {
        let h = Headers::new();
        let r = SerializerRegistry::new();
        let body = preparer(&h, &r, true, true)
            .prepare(Some(&Payload::from("raw=1")))
            .unwrap();
        assert_eq!(text(body), "raw=1");
    }

    #[test]
    fn json_content_type_serializes_composites() {
        let h = headers("application/JSON");
        let r = SerializerRegistry::new();
        let data = Payload::from(json!({"a": [1, 2]}));
        let p = preparer(&h, &r, false, true);
        assert_eq!(p.strategy(), Strategy::Json);
        assert_eq!(text(p.prepare(Some(&data)).unwrap()), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn json_content_type_passes_scalars_through() {
        let h = headers(JSON_MIME);
        let r = SerializerRegistry::new();
        let body = preparer(&h, &r, false, true)
            .prepare(Some(&Payload::from(5i64)))
            .unwrap();
        assert_eq!(text(body), "5");
    }

    #[test]
    fn json_with_blob_is_an_encode_error() {
        let h = headers(JSON_MIME);
        let r = SerializerRegistry::new();
        let data = Payload::object([("f", Payload::Blob(Blob::new(vec![1u8])))]);
        let err = preparer(&h, &r, false, true).prepare(Some(&data)).unwrap_err();
        assert!(matches!(err, RequestError::Encode(_)));
    }

    #[test]
    fn json_without_registered_serializer_fails_lookup() {
        let h = headers(JSON_MIME);
        let r = SerializerRegistry::empty();
        let data = Payload::from(json!({"a": 1}));
        let err = preparer(&h, &r, false, true).prepare(Some(&data)).unwrap_err();
        assert!(matches!(err, RequestError::SerializerNotFound(_)));
    }

    #[test]
    fn url_encoded_content_type_builds_query_string() {
        let h = headers(URL_ENCODED_MIME);
        let r = SerializerRegistry::new();
        let data = Payload::from(json!({"a": 1, "b": {"c": "d e"}}));
        let p = preparer(&h, &r, false, true);
        assert_eq!(p.strategy(), Strategy::UrlEncoded);
        assert_eq!(text(p.prepare(Some(&data)).unwrap()), "a=1&b%5Bc%5D=d%20e");
    }

    #[test]
    fn url_encoded_branch_can_be_disabled() {
        let h = headers(URL_ENCODED_MIME);
        let r = SerializerRegistry::new();
        let data = Payload::from(json!({"a": 1}));
        let p = preparer(&h, &r, false, false);
        assert_eq!(p.strategy(), Strategy::PassThrough);
        assert_eq!(text(p.prepare(Some(&data)).unwrap()), r#"{"a":1}"#);
    }

    #[test]
    fn pass_through_sends_blobs_as_binary() {
        let h = Headers::new();
        let r = SerializerRegistry::new();
        let blob = Blob::new(vec![1u8, 2, 3]);
        let body = preparer(&h, &r, false, true)
            .prepare(Some(&Payload::Blob(blob.clone())))
            .unwrap();
        assert_eq!(body, Some(WireBody::Binary(blob)));
    }

    #[test]
    fn null_means_no_body() {
        let h = headers(JSON_MIME);
        let r = SerializerRegistry::new();
        assert!(preparer(&h, &r, false, true)
            .prepare(Some(&Payload::Null))
            .unwrap()
            .is_none());
    }
}
