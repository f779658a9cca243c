//! The session a team's code holds while talking to the server.

use crate::http::{self, Method, Response};
use crate::tls::{TlsConnector, TlsTransport};
use crate::transport::{Connector, Transport};
use crate::{ConnectionConfig, ConnectionError, Error, Result, StateError};
use servercom_core::{
    Ack, CodeUpdate, Email, Payload, ProtocolError, ServerClock, SessionState, Status,
};

const DATA_PATH: &str = "/data";
const STATUS_PATH: &str = "/status";
const EMAIL_PATH: &str = "/email";
const UPDATE_PATH: &str = "/update";

/// One authenticated session with the server.
///
/// Opening a connection performs the only handshake the session will ever
/// make. Every later call is exactly one request/response exchange on that
/// link and blocks until it completes or the configured timeout fires.
/// Failures are never retried: a transport failure closes the session and
/// the caller must open a new one.
///
/// A `Connection` is not synchronized. All operations take `&mut self`;
/// callers sharing a session between threads must wrap it in their own
/// `Mutex`.
pub struct Connection<T: Transport = TlsTransport> {
    config: ConnectionConfig,
    transport: Option<T>,
    state: SessionState,
    last_status: Option<Status>,
}

impl Connection<TlsTransport> {
    /// Connect over TLS and authenticate.
    pub fn open(config: ConnectionConfig) -> Result<Self, ConnectionError> {
        Self::open_with(&TlsConnector, config)
    }
}

impl<T: Transport> Connection<T> {
    /// Connect through `connector` and authenticate.
    pub fn open_with<C>(connector: &C, config: ConnectionConfig) -> Result<Self, ConnectionError>
    where
        C: Connector<Transport = T>,
    {
        config.validate()?;
        tracing::info!(
            "Connecting to {} as {}",
            config.address(),
            config.credentials.team_name
        );

        let mut session = Self {
            config,
            transport: None,
            state: SessionState::Unconnected,
            last_status: None,
        };
        session.transport = Some(connector.connect(&session.config)?);
        if let Err(e) = session.handshake() {
            tracing::warn!("Handshake with {} failed: {}", session.config.address(), e);
            session.close();
            return Err(e);
        }

        session.state = SessionState::Connected;
        tracing::info!("Connected to {}", session.config.address());
        Ok(session)
    }

    /// Verify the credentials with one authenticated status request.
    fn handshake(&mut self) -> Result<(), ConnectionError> {
        let response = match self.exchange(Method::Get, STATUS_PATH, None) {
            Ok(response) => response,
            Err(Error::Transport(e)) => return Err(ConnectionError::Handshake(e)),
            Err(Error::Protocol(e)) => return Err(ConnectionError::HandshakeResponse(e)),
            Err(other) => {
                return Err(ConnectionError::HandshakeResponse(
                    ProtocolError::MalformedResponse(other.to_string()),
                ));
            }
        };

        match response.code {
            200..=299 => {}
            401 | 403 => return Err(ConnectionError::Unauthorized(response.code)),
            code => return Err(ConnectionError::Rejected(code)),
        }

        // The session owns exactly one link; a server that hangs up after
        // each response cannot carry one.
        if !self.transport.as_ref().is_some_and(Transport::is_open) {
            return Err(ConnectionError::Handshake(crate::TransportError::Closed));
        }

        if let Ok(status) = Status::from_body(&response.body) {
            self.last_status = Some(status);
        }
        Ok(())
    }

    /// Submit one data point.
    pub fn post(&mut self, payload: &Payload) -> Result<Ack> {
        self.require_connected("post")?;
        tracing::debug!("Posting {} data point: {}", payload.data_class(), payload);
        let response = self.request(Method::Post, DATA_PATH, Some(&payload.serialize()))?;
        Ok(Ack::from_response(response.code, &response.body)?)
    }

    /// Ask the server for the current competition state.
    pub fn get_status(&mut self) -> Result<Status> {
        self.require_connected("get_status")?;
        tracing::debug!("Getting status");
        let response = self.request(Method::Get, STATUS_PATH, None)?;
        check_success(&response)?;
        let status = Status::from_body(&response.body)?;
        self.last_status = Some(status.clone());
        Ok(status)
    }

    /// Have the server email the team.
    pub fn email(&mut self, email: &Email) -> Result<Ack> {
        self.require_connected("email")?;
        tracing::debug!("Sending email {:?}", email.subject());
        let response = self.request(Method::Post, EMAIL_PATH, Some(&email.serialize()))?;
        Ok(Ack::from_response(response.code, &response.body)?)
    }

    /// Fetch code the team uploaded, if there is anything new.
    pub fn code_update(&mut self) -> Result<Option<CodeUpdate>> {
        self.require_connected("code_update")?;
        tracing::debug!("Checking for code updates");
        let response = self.request(Method::Get, UPDATE_PATH, None)?;
        check_success(&response)?;
        let update = CodeUpdate::from_body(&response.body)?;
        match &update {
            Some(update) => tracing::info!("New code update ({} bytes)", update.code().len()),
            None => tracing::debug!("No new code update"),
        }
        Ok(update)
    }

    /// Fetch the status and anchor a clock to the server's time.
    pub fn sync_clock(&mut self) -> Result<ServerClock> {
        let status = self.get_status()?;
        Ok(ServerClock::from_status(&status)?)
    }

    /// Release the link. Further requests fail with a [`StateError`].
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            tracing::info!("Closing session with {}", self.config.address());
            transport.close();
        }
        self.state = SessionState::Closed;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// The most recent status seen on this session, if any.
    pub fn last_status(&self) -> Option<&Status> {
        self.last_status.as_ref()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn require_connected(&self, operation: &'static str) -> Result<(), StateError> {
        if self.state == SessionState::Connected {
            Ok(())
        } else {
            Err(StateError {
                operation,
                state: self.state,
            })
        }
    }

    /// An exchange on a connected session. Closes the session when the link
    /// fails or the server hangs up.
    fn request(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response> {
        let result = self.exchange(method, path, body);
        if let Err(Error::Transport(e)) = &result {
            tracing::warn!("{} {} failed, closing session: {}", method, path, e);
            self.close();
        } else if !self.transport.as_ref().is_some_and(Transport::is_open) {
            tracing::info!("Server closed the connection after {} {}", method, path);
            self.close();
        }
        result
    }

    fn exchange(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response> {
        let transport = self.transport.as_mut().ok_or(StateError {
            operation: "send a request",
            state: self.state,
        })?;
        let request = http::encode_request(method, path, &self.config, body);
        tracing::debug!("{} {} ({} byte body)", method, path, body.map_or(0, <[u8]>::len));

        let raw = transport.send(&request)?;
        let response = Response::parse(&raw)?;
        tracing::debug!("{} {} -> HTTP {}", method, path, response.code);
        Ok(response)
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_success(response: &Response) -> Result<(), ProtocolError> {
    match response.code {
        200..=299 => Ok(()),
        401 | 403 => Err(ProtocolError::Unauthorized(response.code)),
        code => Err(ProtocolError::UnexpectedStatus(code)),
    }
}
