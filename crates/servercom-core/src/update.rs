//! Code updates uploaded by the team and served from `GET /update`.

use crate::ProtocolError;
use crate::protocol::decode_body;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

/// A new program image waiting on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUpdate {
    code: Vec<u8>,
}

#[derive(Deserialize)]
struct UpdateBody {
    new: bool,
    #[serde(default)]
    code: Option<String>,
}

impl CodeUpdate {
    /// Parse an update response body. Returns `None` when the server has
    /// nothing newer than what was last fetched.
    pub fn from_body(body: &[u8]) -> Result<Option<Self>, ProtocolError> {
        let body: UpdateBody = decode_body(body)?;
        if !body.new {
            return Ok(None);
        }
        let encoded = body.code.ok_or(ProtocolError::MissingField("code"))?;
        let code = STANDARD
            .decode(encoded.trim())
            .map_err(|source| ProtocolError::Base64 {
                field: "code",
                source,
            })?;
        Ok(Some(Self { code }))
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_code(self) -> Vec<u8> {
        self.code
    }
}
