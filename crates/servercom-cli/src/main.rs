//! `servercom`: talk to the competition server from a terminal.
//!
//! Reads connection settings from a TOML file (see `servercom.toml.example`),
//! lets flags or `SERVERCOM_*` variables override them, opens one session and
//! runs a single command.
//!
//!   servercom status
//!   servercom post temperature 71.6
//!   servercom post text "Test from the bench"
//!   RUST_LOG=debug servercom update --output code.py

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use servercom_client::{Connection, ConnectionConfig, Email, Payload};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Client config file (defaults to ./servercom.toml when present)
    #[arg(short, long, env = "SERVERCOM_CONFIG")]
    config: Option<PathBuf>,

    /// Server address
    #[arg(long, env = "SERVERCOM_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(long, env = "SERVERCOM_PORT")]
    port: Option<u16>,

    #[arg(long, env = "SERVERCOM_TEAM_NAME")]
    team_name: Option<String>,

    #[arg(long, env = "SERVERCOM_TEAM_SECRET", hide_env_values = true)]
    team_secret: Option<String>,

    /// Log request/response progress
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current competition status
    Status,
    /// Submit one data point
    Post {
        #[arg(value_enum)]
        kind: Kind,
        value: String,
    },
    /// Have the server email the team
    Email {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Download a pending code update
    Update {
        /// Where to write the new code
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the server's clock
    Time,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Temperature,
    Humidity,
    Pressure,
    Intensity,
    Text,
    Battery,
    Beacon,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("servercom_client={level}").parse()?)
                .add_directive(format!("servercom={level}").parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    let mut connection = Connection::open(config).context("opening session")?;

    match args.command {
        Command::Status => {
            let status = connection.get_status()?;
            println!("state:  {}", status.state);
            println!("round:  {}", status.round);
            if let Some(team) = &status.team {
                println!("score:  {}", team.score);
                println!("strikes: {}", team.strikes);
            }
            if let Some(version) = &status.server_version {
                println!("server: {version}");
            }
        }
        Command::Post { kind, value } => {
            let payload = build_payload(kind, &value)?;
            let ack = connection.post(&payload)?;
            match &ack.record_id {
                Some(id) => println!("{} ({id})", ack.status),
                None => println!("{}", ack.status),
            }
            if !ack.is_accepted() {
                anyhow::bail!("server did not accept {payload}");
            }
        }
        Command::Email { subject, message } => {
            let ack = connection.email(&Email::new(subject, message)?)?;
            println!("{}", ack.status);
        }
        Command::Update { output } => match connection.code_update()? {
            Some(update) => {
                std::fs::write(&output, update.code())
                    .with_context(|| format!("writing {}", output.display()))?;
                println!("wrote {} bytes to {}", update.code().len(), output.display());
            }
            None => println!("no new update"),
        },
        Command::Time => {
            let clock = connection.sync_clock()?;
            println!("{}", clock.now_unix());
        }
    }

    connection.close();
    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<ConnectionConfig> {
    let mut config = config::resolve(args.config.as_deref())?;
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(name) = &args.team_name {
        config.credentials.team_name = name.clone();
    }
    if let Some(secret) = &args.team_secret {
        config.credentials.team_secret = secret.clone();
    }
    tracing::debug!("Using {:?}", config);
    Ok(config)
}

fn build_payload(kind: Kind, value: &str) -> anyhow::Result<Payload> {
    let number = || {
        value
            .trim()
            .parse::<f64>()
            .with_context(|| format!("{value:?} is not a number"))
    };
    let payload = match kind {
        Kind::Temperature => Payload::temperature(number()?)?,
        Kind::Humidity => Payload::humidity(number()?)?,
        Kind::Pressure => Payload::pressure(number()?)?,
        Kind::Intensity => Payload::intensity(number()?)?,
        Kind::Text => Payload::text(value)?,
        Kind::Beacon => Payload::beacon_challenge(value)?,
        Kind::Battery => {
            let percent = value
                .trim()
                .parse::<u8>()
                .with_context(|| format!("{value:?} is not a whole percentage"))?;
            Payload::battery_level(percent)?
        }
    };
    Ok(payload)
}
