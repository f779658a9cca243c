//! Core types for the servercom data API.
//!
//! This crate provides the wire contract: the closed set of payloads a team
//! can submit, and the records the server sends back. It performs no I/O;
//! `servercom-client` owns the session and the transport.

mod ack;
mod clock;
mod email;
mod payload;
mod protocol;
mod status;
mod update;

pub use ack::{Ack, AckStatus};
pub use clock::ServerClock;
pub use email::Email;
pub use payload::{DataClass, MAX_TEXT_LEN, Payload, ValueError};
pub use protocol::ProtocolError;
pub use status::{Status, TeamStatus};
pub use update::CodeUpdate;

use std::fmt;

/// Session lifecycle state.
///
/// `Unconnected` only exists while a session is being opened; `Closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Handshake in progress.
    Unconnected,
    /// Requests may be issued.
    Connected,
    /// Closed explicitly or after an unrecoverable transport failure.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
            Self::Closed => "closed",
        })
    }
}
