//! Error types for servercom-client.

use servercom_core::{ProtocolError, SessionState, ValueError};
use std::io;
use thiserror::Error;

/// Opening a session failed. The session never reached `Connected`.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid connection config: {0}")]
    InvalidConfig(String),

    #[error("failed to connect to {address}: {source}")]
    Unreachable {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("unusable server certificate: {0}")]
    Certificate(String),

    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    #[error("server did not accept the team credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("server refused the session (HTTP {0})")]
    Rejected(u16),

    #[error("handshake request failed: {0}")]
    Handshake(#[source] TransportError),

    #[error("handshake response was malformed: {0}")]
    HandshakeResponse(#[source] ProtocolError),
}

/// The link failed during a request. The session is closed afterwards.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("timed out waiting for the server: {0}")]
    Timeout(#[source] io::Error),

    #[error("connection reset by the server: {0}")]
    Reset(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout(err),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::Reset(err),
            _ => Self::Io(err),
        }
    }
}

/// An operation was attempted outside the `Connected` state. No I/O happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {operation} while the session is {state}")]
pub struct StateError {
    pub operation: &'static str,
    pub state: SessionState,
}

/// Any failure surfaced by the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
