//! Client config file handling.

use anyhow::Context;
use serde::Deserialize;
use servercom_client::ConnectionConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked for in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "servercom.toml";

/// On-disk layout: the connection config plus an optional certificate file
/// read in place of an inline `server_cert`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClientFile {
    #[serde(flatten)]
    connection: ConnectionConfig,
    server_cert_file: Option<PathBuf>,
}

/// Load a config file. A relative `server_cert_file` is resolved against the
/// file's directory.
pub fn load(path: &Path) -> anyhow::Result<ConnectionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let file: ClientFile =
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?;

    let mut config = file.connection;
    if let Some(cert) = file.server_cert_file {
        let cert = match path.parent() {
            Some(dir) if cert.is_relative() => dir.join(cert),
            _ => cert,
        };
        let pem = fs::read_to_string(&cert)
            .with_context(|| format!("reading server certificate {}", cert.display()))?;
        config.server_cert = Some(pem);
    }
    Ok(config)
}

/// Load `path` if given, else the default file if present, else defaults.
pub fn resolve(path: Option<&Path>) -> anyhow::Result<ConnectionConfig> {
    match path {
        Some(path) => load(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load(Path::new(DEFAULT_CONFIG_FILE)),
        None => {
            tracing::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
            Ok(ConnectionConfig::default())
        }
    }
}
