//! Competition status reported by `GET /status`.

use crate::ProtocolError;
use crate::protocol::decode_body;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Members every status response must carry.
const REQUIRED: [&str; 2] = ["state", "round"];

/// Server-reported competition state at one point in time.
///
/// `state` and `round` are required; everything else is optional and fields
/// this client does not know about are ignored. Servers that only report the
/// clock and team score (no `state`/`round`) are not supported: every status
/// request against them fails with [`ProtocolError::MissingField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Game phase, e.g. `"ACTIVE"`.
    pub state: String,
    /// Current round number.
    pub round: u32,
    /// Server wall clock, seconds since the UNIX epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_time: Option<u64>,
    /// Server wall clock, seconds since 2020-01-01 (board-friendly epoch).
    #[serde(rename = "2020_time", default, skip_serializing_if = "Option::is_none")]
    pub time_2020: Option<u64>,
    /// The requesting team's standing.
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamStatus>,
    #[serde(
        rename = "CubeServer_version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_version: Option<String>,
}

/// Score card for the authenticated team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatus {
    pub score: f64,
    #[serde(default)]
    pub strikes: u32,
}

impl Status {
    /// Parse a status response body.
    pub fn from_body(body: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = decode_body(body)?;
        if let Some(fields) = value.as_object() {
            if let Some(missing) = REQUIRED.into_iter().find(|f| !fields.contains_key(*f)) {
                return Err(ProtocolError::MissingField(missing));
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}
