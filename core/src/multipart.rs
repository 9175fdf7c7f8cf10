//! `multipart/form-data` assembly for flattened form fields.

use uuid::Uuid;

use crate::flatten::{FormEntry, FormValue};

const DEFAULT_BLOB_NAME: &str = "blob";
const DEFAULT_BLOB_MIME: &str = "application/octet-stream";

/// A form ready to be written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartForm {
    boundary: String,
    entries: Vec<FormEntry>,
}

impl MultipartForm {
    /// Wrap form entries with a freshly generated boundary.
    pub fn new(entries: Vec<FormEntry>) -> Self {
        Self::with_boundary(format!("----courier-{}", Uuid::new_v4().simple()), entries)
    }

    pub fn with_boundary(boundary: impl Into<String>, entries: Vec<FormEntry>) -> Self {
        Self {
            boundary: boundary.into(),
            entries,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn entries(&self) -> &[FormEntry] {
        &self.entries
    }

    /// Value for the `Content-Type` header of this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the full body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let name = escape_field(&entry.name);
            match &entry.value {
                FormValue::Text(text) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    out.extend_from_slice(text.as_bytes());
                }
                FormValue::Blob(blob) => {
                    let filename = escape_field(blob.filename().unwrap_or(DEFAULT_BLOB_NAME));
                    let mime = blob.mime().unwrap_or(DEFAULT_BLOB_MIME);
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(blob.data());
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

// Quotes and line breaks would end the header early.
fn escape_field(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}
