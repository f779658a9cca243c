//! Errors raised while interpreting server responses.

use crate::ValueError;
use serde::de::DeserializeOwned;

/// The server answered with something this client cannot accept.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed HTTP response: {0}")]
    MalformedResponse(String),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unexpected value for `{field}`: {value}")]
    UnexpectedValue { field: &'static str, value: String },
    #[error("invalid base64 in `{field}`: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    #[error("server did not accept the credentials (HTTP {0})")]
    Unauthorized(u16),
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
    #[error(transparent)]
    InvalidValue(#[from] ValueError),
}

/// Decode a JSON response body. Unknown fields are ignored by the target types.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(body)?)
}
