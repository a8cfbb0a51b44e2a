//! Command-line interface for the `qcat` binary.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use qcat_config::{Config, ConfigError, LoggingConfig, Protocol, Role, TlsConfig, load_config};
use qcat_core::defaults::{
    DEFAULT_CONNECT_ADDR, DEFAULT_LISTEN_ADDR, DEFAULT_LOG_LEVEL, VERBOSE_LOG_LEVEL,
    VERBOSE_QUIET_TARGETS,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// qcat CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "qcat",
    version,
    about = "Relay stdin/stdout to a single QUIC, TCP or UDP peer",
    propagate_version = true
)]
pub struct Cli {
    /// Transport: quic, tcp or udp [default: quic]
    #[arg(short, long, global = true)]
    pub protocol: Option<Protocol>,

    /// Log every read and write with a hex preview.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (toml). Command-line flags take precedence.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Wait for one peer and relay stdio over the session.
    #[command(alias = "l")]
    Listen(ListenArgs),

    /// Connect to a listening peer and relay stdio over the session.
    #[command(alias = "c")]
    Connect(ConnectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Address to listen on, `[host]:port` [default: :8000]
    #[arg(short, long)]
    pub listen: Option<String>,

    /// QUIC max idle timeout, e.g. `30s` or `2m` (0 = transport default).
    #[arg(long, value_parser = qcat_config::parse_duration)]
    pub idle_timeout: Option<Duration>,

    /// PEM certificate for the QUIC listener (self-signed when omitted).
    #[arg(long, requires = "key")]
    pub cert: Option<String>,

    /// PEM private key matching `--cert`.
    #[arg(long, requires = "cert")]
    pub key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Address to connect to, `host:port` [default: localhost:8000]
    #[arg(short, long)]
    pub connect: Option<String>,
}

impl Cli {
    pub fn role(&self) -> Role {
        match self.command {
            Command::Listen(_) => Role::Server,
            Command::Connect(_) => Role::Client,
        }
    }
}

/// Layer the command line over the optional config file.
pub fn build_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(protocol) = cli.protocol {
        config.protocol = protocol;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }

    let (address, default_address) = match &cli.command {
        Command::Listen(args) => {
            if let Some(idle_timeout) = args.idle_timeout {
                config.idle_timeout = Some(idle_timeout);
            }
            if let (Some(cert), Some(key)) = (&args.cert, &args.key) {
                config.tls = Some(TlsConfig {
                    cert: cert.clone(),
                    key: key.clone(),
                });
            }
            (args.listen.as_ref(), DEFAULT_LISTEN_ADDR)
        }
        Command::Connect(args) => (args.connect.as_ref(), DEFAULT_CONNECT_ADDR),
    };
    if let Some(address) = address {
        config.address = address.clone();
    }
    if config.address.is_empty() {
        config.address = default_address.to_string();
    }

    Ok(config)
}

/// Run the selected role. Validation failures surface before any socket is
/// opened.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&cli)?;
    init_tracing(&config.logging, config.verbose, cli.log_level.as_deref());
    info!(role = %cli.role(), transport = %config.protocol, addr = %config.address, "starting");

    match cli.role() {
        Role::Server => {
            tokio::select! {
                result = qcat_server::serve(&config) => {
                    if let Err(e) = &result {
                        debug!(error = %e, error_type = e.error_type(), "listen failed");
                    }
                    result?;
                }
                signal = shutdown_signal() => {
                    info!(signal, "listener stopped");
                }
            }
        }
        Role::Client => {
            let shutdown = CancellationToken::new();
            let token = shutdown.clone();
            tokio::spawn(async move {
                let signal = shutdown_signal().await;
                info!(signal, "cancelling session");
                token.cancel();
            });

            if let Err(e) = qcat_client::run(&config, shutdown).await {
                debug!(error = %e, error_type = e.error_type(), "connect failed");
                return Err(e.into());
            }
        }
    }
    Ok(())
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                return tokio::select! {
                    _ = interrupt() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                };
            }
            Err(e) => warn!(error = %e, "SIGTERM handler unavailable"),
        }
    }

    interrupt().await;
    "SIGINT"
}

/// Ctrl-C, or never if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Base log level: `--log-level`, then `--verbose`, then the config file.
fn base_level<'a>(config: &'a LoggingConfig, verbose: bool, cli_level: Option<&'a str>) -> &'a str {
    match (cli_level, verbose) {
        (Some(level), _) => level,
        (None, true) => VERBOSE_LOG_LEVEL,
        (None, false) => config.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
    }
}

/// `EnvFilter` directives. `--verbose` alone keeps QUIC and TLS internals at
/// warn so traffic lines stay readable; configured filters still win.
fn filter_directives(config: &LoggingConfig, verbose: bool, cli_level: Option<&str>) -> String {
    let mut directives = vec![base_level(config, verbose, cli_level).to_string()];
    if verbose && cli_level.is_none() {
        directives.extend(
            VERBOSE_QUIET_TARGETS
                .iter()
                .map(|target| format!("{target}={DEFAULT_LOG_LEVEL}")),
        );
    }
    directives.extend(
        config
            .filters
            .iter()
            .map(|(module, level)| format!("{module}={level}")),
    );
    directives.join(",")
}

/// Initialize tracing. Always writes to stderr; stdout carries session data.
fn init_tracing(config: &LoggingConfig, verbose: bool, cli_level: Option<&str>) {
    let filter_str = filter_directives(config, verbose, cli_level);

    let filter =
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    match config.format.as_deref().unwrap_or("pretty") {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}
