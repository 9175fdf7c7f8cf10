//! Verify body preparation and response classification against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Each vector file lists inputs and the expected outcome. Comparing parsed
//! JSON (not raw strings) where possible avoids false negatives from
//! field-ordering differences.

use courier_core::headers::Headers;
use courier_core::prepare::Preparer;
use courier_core::response::classify;
use courier_core::{
    Payload, RequestFailure, SerializerRegistry, TransportResponse, Unserializer, WireBody,
};
use serde_json::Value;

fn response(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Classify
// ---------------------------------------------------------------------------

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let registry = SerializerRegistry::new();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        let check_status = case["check_status"].as_bool().unwrap();
        let expected = &case["expected"];

        let result = classify(&response(body), &Unserializer::default(), &registry, check_status);

        match expected["outcome"].as_str().unwrap() {
            "success" => {
                let ok = result.unwrap_or_else(|e| panic!("{name}: expected success, got {e}"));
                assert_eq!(ok.data, expected["data"], "{name}: data");
                assert_eq!(ok.raw, body, "{name}: raw");
            }
            "rejected" => {
                let err = result.unwrap_err();
                assert!(matches!(err, RequestFailure::Rejected { .. }), "{name}: kind");
                assert_eq!(err.message(), expected["message"].as_str().unwrap(), "{name}: message");
                assert_eq!(err.raw(), Some(body), "{name}: raw");
            }
            "decode" => {
                let err = result.unwrap_err();
                assert!(matches!(err, RequestFailure::Decode { .. }), "{name}: kind");
                assert!(err.data().is_none(), "{name}: no decoded data");
            }
            other => panic!("{name}: unknown outcome: {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Prepare
// ---------------------------------------------------------------------------

#[test]
fn prepare_test_vectors() {
    let raw = include_str!("../../test-vectors/prepare.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let registry = SerializerRegistry::new();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let headers = Headers::from_json(case["headers"].clone()).unwrap();
        let data = match &case["data"] {
            Value::Null => None,
            other => Some(Payload::from(other.clone())),
        };
        let preparer = Preparer {
            headers: &headers,
            send_form: case["send_form"].as_bool().unwrap(),
            url_encoded_bodies: case["url_encoded_bodies"].as_bool().unwrap(),
            serializers: &registry,
        };
        let expected = &case["expected"];

        let body = preparer.prepare(data.as_ref()).unwrap();

        match expected["kind"].as_str().unwrap() {
            "none" => assert!(body.is_none(), "{name}: expected no body"),
            "text" => match body {
                Some(WireBody::Text(text)) => {
                    assert_eq!(text, expected["value"].as_str().unwrap(), "{name}: text")
                }
                other => panic!("{name}: expected text, got {other:?}"),
            },
            "form" => match body {
                Some(WireBody::Form(form)) => {
                    let fields: Vec<&str> = form.entries().iter().map(|e| e.name.as_str()).collect();
                    let expected: Vec<&str> = expected["fields"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|f| f.as_str().unwrap())
                        .collect();
                    assert_eq!(fields, expected, "{name}: fields");
                }
                other => panic!("{name}: expected form, got {other:?}"),
            },
            other => panic!("{name}: unknown kind: {other}"),
        }
    }
}
