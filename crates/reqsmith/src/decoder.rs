//! Response body decoders
//!
//! A decoder is the accept-side strategy selected by MIME type. Only the
//! JSON decoder deserializes into the caller's target; the form and text
//! decoders consume the body so the connection can be reused and leave the
//! target untouched.

use std::io::Read;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::{FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};

/// Decoding strategy for an incoming response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyDecoder {
    /// `application/x-www-form-urlencoded` responses are drained and
    /// discarded
    Form,
    /// `application/json` responses deserialize into the target
    Json,
    /// `text/plain` responses are drained and discarded
    Text,
}

impl BodyDecoder {
    /// The Accept value this decoder advertises to the server.
    pub fn accept(&self) -> &'static str {
        match self {
            BodyDecoder::Form => FORM_CONTENT_TYPE,
            BodyDecoder::Json => JSON_CONTENT_TYPE,
            BodyDecoder::Text => TEXT_CONTENT_TYPE,
        }
    }

    /// Look up the decoder for a MIME type. Unknown types have no decoder;
    /// their responses are drained without touching any target.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            FORM_CONTENT_TYPE => Some(BodyDecoder::Form),
            JSON_CONTENT_TYPE => Some(BodyDecoder::Json),
            TEXT_CONTENT_TYPE => Some(BodyDecoder::Text),
            _ => None,
        }
    }

    /// Decode `body` into `target`.
    pub fn decode<T: DeserializeOwned>(&self, body: impl Read, target: &mut T) -> Result<()> {
        match self {
            BodyDecoder::Json => {
                *target =
                    serde_json::from_reader(body).map_err(|err| Error::Decode(err.to_string()))?;
                Ok(())
            }
            BodyDecoder::Form | BodyDecoder::Text => drain(body),
        }
    }
}

/// Read and discard the remainder of `body`.
pub(crate) fn drain(mut body: impl Read) -> Result<()> {
    std::io::copy(&mut body, &mut std::io::sink())?;
    Ok(())
}
