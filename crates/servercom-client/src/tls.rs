//! TLS transport using `rustls`.
//!
//! The server certificate is verified against the CA(s) in
//! [`ConnectionConfig::server_cert`], or the platform roots when none are
//! configured, under the name [`ConnectionConfig::server_name`].

use crate::transport::{Connector, Stream, StreamTransport, open_tcp};
use crate::{ConnectionConfig, ConnectionError};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

/// A TLS client stream over TCP.
pub type TlsStream = StreamOwned<ClientConnection, TcpStream>;

/// Encrypted transport to the server.
pub type TlsTransport = StreamTransport<TlsStream>;

impl Stream for TlsStream {
    fn shutdown(&mut self) {
        self.conn.send_close_notify();
        let _ = self.conn.complete_io(&mut self.sock);
        let _ = self.sock.shutdown(Shutdown::Both);
    }
}

/// Connects over TCP and completes the TLS handshake before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsConnector;

impl Connector for TlsConnector {
    type Transport = TlsTransport;

    fn connect(&self, config: &ConnectionConfig) -> Result<TlsTransport, ConnectionError> {
        let server_name = ServerName::try_from(config.server_name.clone()).map_err(|e| {
            ConnectionError::InvalidConfig(format!(
                "server_name {:?} is not a valid DNS name or IP: {e}",
                config.server_name
            ))
        })?;
        let tls_config = client_config(config)?;

        let tcp = open_tcp(config)?;
        let conn = ClientConnection::new(tls_config, server_name)
            .map_err(|e| ConnectionError::Tls(io::Error::other(e)))?;
        let mut stream = StreamOwned::new(conn, tcp);

        tracing::debug!("Performing TLS handshake with {}", config.address());
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(ConnectionError::Tls)?;
        }

        Ok(StreamTransport::new(stream, config.address()))
    }
}

fn client_config(config: &ConnectionConfig) -> Result<Arc<ClientConfig>, ConnectionError> {
    let roots = match &config.server_cert {
        Some(pem) => pinned_roots(pem)?,
        None => native_roots()?,
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let tls = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ConnectionError::Tls(io::Error::other(e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(tls))
}

/// Trust exactly the PEM certificates supplied with the config.
fn pinned_roots(pem: &str) -> Result<RootCertStore, ConnectionError> {
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut pem.as_bytes()) {
        let cert = cert.map_err(|e| ConnectionError::Certificate(e.to_string()))?;
        roots
            .add(cert)
            .map_err(|e| ConnectionError::Certificate(e.to_string()))?;
    }
    if roots.is_empty() {
        return Err(ConnectionError::Certificate(
            "server_cert contains no PEM certificates".into(),
        ));
    }
    Ok(roots)
}

fn native_roots() -> Result<RootCertStore, ConnectionError> {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs()
        .map_err(|e| ConnectionError::Certificate(format!("loading system roots: {e}")))?;
    let (added, ignored) = roots.add_parsable_certificates(certs);
    tracing::debug!("Loaded {} system root certificates ({} ignored)", added, ignored);
    if roots.is_empty() {
        return Err(ConnectionError::Certificate(
            "no usable system root certificates".into(),
        ));
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;

    #[test]
    fn pem_without_certificates_rejected() {
        assert!(matches!(
            pinned_roots("not a certificate"),
            Err(ConnectionError::Certificate(_))
        ));
    }

    #[test]
    fn invalid_server_name_rejected_before_io() {
        let mut config = ConnectionConfig::new(Credentials::new("team", "secret"));
        config.server_name = "not a hostname!".into();
        assert!(matches!(
            TlsConnector.connect(&config),
            Err(ConnectionError::InvalidConfig(_))
        ));
    }
}
