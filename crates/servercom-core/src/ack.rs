//! Acknowledgements for submitted records.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Whether the server kept the submitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Accepted,
    Rejected,
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        })
    }
}

/// The server's answer to a `POST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub status: AckStatus,
    /// Server-assigned record id, when the server reports one.
    pub record_id: Option<String>,
    /// HTTP status code of the response.
    pub code: u16,
}

impl Ack {
    /// Interpret a response to a submission.
    ///
    /// A JSON body with a `status` member decides the outcome. Without one,
    /// `201 Created` means accepted and any other success code means the
    /// server declined to store the record.
    pub fn from_response(code: u16, body: &[u8]) -> Result<Self, ProtocolError> {
        match code {
            401 | 403 => return Err(ProtocolError::Unauthorized(code)),
            200..=299 => {}
            _ => return Err(ProtocolError::UnexpectedStatus(code)),
        }

        let by_code = if code == 201 {
            AckStatus::Accepted
        } else {
            AckStatus::Rejected
        };

        // Plain-text and empty bodies are legal; only JSON objects carry fields.
        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
            return Ok(Self {
                status: by_code,
                record_id: None,
                code,
            });
        };

        let status = match fields.get("status") {
            None => by_code,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("accepted") => AckStatus::Accepted,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("rejected") => AckStatus::Rejected,
            Some(other) => {
                return Err(ProtocolError::UnexpectedValue {
                    field: "status",
                    value: other.to_string(),
                });
            }
        };

        let record_id = match fields.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(ProtocolError::UnexpectedValue {
                    field: "id",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            status,
            record_id,
            code,
        })
    }

    pub fn is_accepted(&self) -> bool {
        self.status == AckStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_without_body_is_accepted() {
        let ack = Ack::from_response(201, b"").unwrap();
        assert!(ack.is_accepted());
        assert_eq!(ack.record_id, None);
    }

    #[test]
    fn ok_without_status_is_rejected() {
        let ack = Ack::from_response(200, b"OK").unwrap();
        assert_eq!(ack.status, AckStatus::Rejected);
    }

    #[test]
    fn body_status_wins() {
        let ack = Ack::from_response(200, br#"{"status":"accepted","id":42}"#).unwrap();
        assert_eq!(ack.status.to_string(), "accepted");
        assert_eq!(ack.record_id.as_deref(), Some("42"));

        let ack = Ack::from_response(201, br#"{"status":"rejected","reason":"late"}"#).unwrap();
        assert_eq!(ack.status, AckStatus::Rejected);
    }

    #[test]
    fn bad_status_member() {
        let err = Ack::from_response(201, br#"{"status":"maybe"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedValue { field: "status", .. }));
    }

    #[test]
    fn error_codes() {
        assert!(matches!(
            Ack::from_response(401, b""),
            Err(ProtocolError::Unauthorized(401))
        ));
        assert!(matches!(
            Ack::from_response(500, b""),
            Err(ProtocolError::UnexpectedStatus(500))
        ));
    }
}
