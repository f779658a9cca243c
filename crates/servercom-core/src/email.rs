//! Emails relayed by the server to the team.

use crate::ValueError;

/// A message the server forwards to the team's registered address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    subject: String,
    message: String,
}

impl Email {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Result<Self, ValueError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(ValueError::Empty { field: "subject" });
        }
        Ok(Self {
            subject,
            message: message.into(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Encode the wire body.
    pub fn serialize(&self) -> Vec<u8> {
        let body = serde_json::json!({
            "subject": self.subject,
            "message": self.message,
        });
        body.to_string().into_bytes()
    }
}
