//! Request body providers
//!
//! A provider is the encoding strategy attached to an outgoing payload. The
//! payload itself is captured as a [`serde_json::Value`] when the body is
//! attached; the wire encoding happens when the request fires, so encode
//! failures surface from the execute call rather than from the setter.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::{FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};

/// Encoding strategy for an outgoing request body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyProvider {
    /// `application/x-www-form-urlencoded`; the payload must reflect into
    /// flat key/value pairs
    Form(Value),
    /// `application/json` via standard JSON serialization
    Json(Value),
    /// Declares `text/plain` and produces an empty body; kept for parity
    /// with the accept-side handling of plain text
    Text(Value),
}

impl BodyProvider {
    /// The Content-Type this provider declares on the outgoing request.
    pub fn content_type(&self) -> &'static str {
        match self {
            BodyProvider::Form(_) => FORM_CONTENT_TYPE,
            BodyProvider::Json(_) => JSON_CONTENT_TYPE,
            BodyProvider::Text(_) => TEXT_CONTENT_TYPE,
        }
    }

    /// Encode the captured payload into the outgoing body bytes.
    ///
    /// Form payloads encode their keys in alphabetical order with spaces as
    /// `+`; payloads that do not flatten into key/value pairs are an
    /// [`Error::Encode`]. Text bodies are always empty.
    pub fn body(&self) -> Result<Vec<u8>> {
        match self {
            BodyProvider::Form(value) => serde_urlencoded::to_string(value)
                .map(String::into_bytes)
                .map_err(|err| Error::Encode(err.to_string())),
            BodyProvider::Json(value) => {
                serde_json::to_vec(value).map_err(|err| Error::Encode(err.to_string()))
            }
            BodyProvider::Text(_) => Ok(Vec::new()),
        }
    }
}
