//! The link between a session and the server.
//!
//! A [`Connector`] opens one link per session; the resulting [`Transport`]
//! carries raw request bytes out and one complete raw response back.

use crate::http;
use crate::{ConnectionConfig, ConnectionError, TransportError};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

/// An open link to the server, exclusively owned by one session.
pub trait Transport {
    /// Send one request and block until its full response has arrived.
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Release the link. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Opens transports.
pub trait Connector {
    type Transport: Transport;

    /// Establish a link. Never retries.
    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Transport, ConnectionError>;
}

/// A byte stream that can be shut down politely.
pub trait Stream: Read + Write {
    fn shutdown(&mut self);
}

impl Stream for TcpStream {
    fn shutdown(&mut self) {
        let _ = TcpStream::shutdown(self, Shutdown::Both);
    }
}

/// A [`Transport`] speaking HTTP/1.1 over any [`Stream`].
pub struct StreamTransport<S: Stream> {
    stream: Option<S>,
    peer: String,
}

/// Unencrypted transport, for TLS-terminating proxies and local servers.
pub type PlainTransport = StreamTransport<TcpStream>;

impl<S: Stream> StreamTransport<S> {
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            peer: peer.into(),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl<S: Stream> Transport for StreamTransport<S> {
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;

        stream.write_all(request)?;
        stream.flush()?;
        tracing::debug!("Sent {} bytes to {}", request.len(), self.peer);

        let response = http::read_message(stream)?;
        tracing::debug!("Received {} bytes from {}", response.len(), self.peer);

        if http::announces_close(&response) {
            tracing::debug!("{} announced it will close the connection", self.peer);
            self.close();
        }
        Ok(response)
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!("Closing connection to {}", self.peer);
            stream.shutdown();
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl<S: Stream> Drop for StreamTransport<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connects over plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainConnector;

impl Connector for PlainConnector {
    type Transport = PlainTransport;

    fn connect(&self, config: &ConnectionConfig) -> Result<PlainTransport, ConnectionError> {
        let tcp = open_tcp(config)?;
        Ok(StreamTransport::new(tcp, config.address()))
    }
}

/// Open a TCP stream with the configured timeouts applied.
pub(crate) fn open_tcp(config: &ConnectionConfig) -> Result<TcpStream, ConnectionError> {
    let address = config.address();
    let unreachable = |source: io::Error| ConnectionError::Unreachable {
        address: address.clone(),
        source,
    };

    let addrs = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(unreachable)?;

    let mut last_err = None;
    for addr in addrs {
        tracing::debug!("Connecting to {} ({})", address, addr);
        match TcpStream::connect_timeout(&addr, config.timeout()) {
            Ok(tcp) => {
                tcp.set_read_timeout(Some(config.timeout()))
                    .and_then(|()| tcp.set_write_timeout(Some(config.timeout())))
                    .and_then(|()| tcp.set_nodelay(true))
                    .map_err(unreachable)?;
                return Ok(tcp);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(unreachable(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reads canned bytes, records writes.
    struct Canned {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for Canned {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Canned {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Stream for Canned {
        fn shutdown(&mut self) {}
    }

    fn canned(input: &[u8]) -> Canned {
        Canned {
            input: Cursor::new(input.to_vec()),
            written: Vec::new(),
        }
    }

    #[test]
    fn send_returns_one_response() {
        let mut transport = StreamTransport::new(
            canned(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi"),
            "test",
        );
        let raw = transport.send(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(raw.ends_with(b"hi"));
        assert!(transport.is_open());
        let written = &transport.stream.as_ref().unwrap().written;
        assert_eq!(written, b"GET / HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn server_close_closes_transport() {
        let mut transport = StreamTransport::new(
            canned(b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 0\r\n\r\n"),
            "test",
        );
        transport.send(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(!transport.is_open());
        assert!(matches!(
            transport.send(b"GET / HTTP/1.1\r\n\r\n"),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn eof_is_a_reset() {
        let mut transport = StreamTransport::new(canned(b""), "test");
        assert!(matches!(
            transport.send(b"GET / HTTP/1.1\r\n\r\n"),
            Err(TransportError::Reset(_))
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = StreamTransport::new(canned(b""), "test");
        transport.close();
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn unresolvable_host_is_unreachable() {
        let config = ConnectionConfig::default().with_endpoint("host.invalid", 1);
        assert!(matches!(
            open_tcp(&config),
            Err(ConnectionError::Unreachable { .. })
        ));
    }
}
