//! Blocking client for the servercom data API.
//!
//! ```no_run
//! use servercom_client::{Connection, ConnectionConfig, Credentials, Payload};
//!
//! # fn main() -> servercom_client::Result<()> {
//! let config = ConnectionConfig::new(Credentials::new("team-7", "s3cret"));
//! let mut connection = Connection::open(config)?;
//! connection.post(&Payload::text("Hello from the cube!")?)?;
//! println!("{:?}", connection.get_status()?);
//! # Ok(())
//! # }
//! ```
//!
//! Every call blocks until its single network exchange completes. Nothing is
//! retried; on failure, open a new [`Connection`].

mod config;
mod error;
pub mod http;
mod session;
mod tls;
pub mod transport;

pub use config::{ConnectionConfig, Credentials, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
pub use error::{ConnectionError, Error, Result, StateError, TransportError};
pub use session::Connection;
pub use tls::{TlsConnector, TlsStream, TlsTransport};
pub use transport::{Connector, PlainConnector, PlainTransport, StreamTransport, Transport};

pub use servercom_core::{
    Ack, AckStatus, CodeUpdate, DataClass, Email, MAX_TEXT_LEN, Payload, ProtocolError,
    ServerClock, SessionState, Status, TeamStatus, ValueError,
};
