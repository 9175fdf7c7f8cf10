//! Flattening nested payloads into query strings and form fields.
//!
//! Both walks name nested values with bracket suffixes, so
//! `{"user": {"name": "a"}}` becomes the key `user[name]`. The form walk
//! additionally renames blobs sitting at numeric positions to `file`, which
//! is how an array of uploads is conventionally posted.
//!
//! Both functions are pure: they build and return a fresh list of entries.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::payload::{Blob, Payload};

/// Everything except the characters a URI component may carry unescaped
/// (`A-Z a-z 0-9 - _ . ! ~ * ' ( )`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Field name used for blobs found at a numeric position.
pub const FILE_FIELD: &str = "file";

/// Percent-encode a single query component.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

fn compose(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}[{key}]"),
        None => key.to_string(),
    }
}

/// Unencoded `(key, value)` leaves of a payload, in enumeration order.
///
/// Blobs and file lists have no textual form and are skipped.
pub fn query_pairs(value: &Payload, prefix: Option<&str>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (p, v) in value.entries() {
        let key = compose(prefix, &p);
        match v {
            Payload::Array(_) | Payload::Object(_) => {
                pairs.extend(query_pairs(v, Some(key.as_str())))
            }
            Payload::Blob(_) | Payload::FileList(_) => {}
            scalar => {
                if let Some(text) = scalar.scalar_text() {
                    pairs.push((key, text));
                }
            }
        }
    }
    pairs
}

/// Serialize a payload as an `application/x-www-form-urlencoded` string.
///
/// A scalar at the top level is taken to be pre-encoded and is returned as
/// its plain string form.
pub fn query_string(value: &Payload) -> String {
    if !value.is_composite() {
        return value.scalar_text().unwrap_or_default();
    }
    query_pairs(value, None)
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Value of a single form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Blob(Blob),
}

/// One flattened form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub name: String,
    pub value: FormValue,
}

impl FormEntry {
    fn text(name: String, text: String) -> Self {
        Self {
            name,
            value: FormValue::Text(text),
        }
    }

    fn blob(name: String, blob: &Blob) -> Self {
        Self {
            name,
            value: FormValue::Blob(blob.clone()),
        }
    }
}

fn is_plain_integer(name: &str) -> bool {
    name.parse::<i64>().is_ok()
}

fn blob_field(name: &str) -> &str {
    if is_plain_integer(name) {
        FILE_FIELD
    } else {
        name
    }
}

/// Flatten a payload into form fields, one per leaf.
///
/// Nulls are dropped. A blob at the top level becomes a single `file` field.
pub fn form_entries(value: &Payload) -> Vec<FormEntry> {
    match value {
        Payload::Blob(blob) => vec![FormEntry::blob(FILE_FIELD.to_string(), blob)],
        _ => form_fields(value, None),
    }
}

fn form_fields(value: &Payload, prefix: Option<&str>) -> Vec<FormEntry> {
    let mut fields = Vec::new();
    if let Payload::FileList(files) = value {
        for (i, blob) in files.iter().enumerate() {
            let name = compose(prefix, blob_field(&i.to_string()));
            fields.push(FormEntry::blob(name, blob));
        }
        return fields;
    }

    for (name, v) in value.entries() {
        match v {
            Payload::Blob(blob) => {
                fields.push(FormEntry::blob(compose(prefix, blob_field(&name)), blob));
            }
            Payload::Array(_) | Payload::Object(_) | Payload::FileList(_) => {
                let nested = compose(prefix, &name);
                fields.extend(form_fields(v, Some(nested.as_str())));
            }
            Payload::Null => {}
            scalar => {
                if let Some(text) = scalar.scalar_text() {
                    fields.push(FormEntry::text(compose(prefix, &name), text));
                }
            }
        }
    }
    fields
}
