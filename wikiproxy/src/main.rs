mod config;
mod telemetry;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use http::{Method, Request, StatusCode};
use hyper::body::Bytes;
use lookup_proxy::{Dispatcher, LookupError};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use telemetry::TelemetryError;

#[derive(Parser)]
#[command(name = "wikiproxy", version, about = "Batch lookups against Wikipedia and Wikidata")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve batch lookups over HTTP
    Serve(ServeArgs),
    /// Run a single batch request and print the response body
    Lookup(LookupArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long)]
    config_path: PathBuf,
}

#[derive(Args)]
struct LookupArgs {
    /// Configuration file; public endpoints and defaults are used without one
    #[arg(long)]
    config_path: Option<PathBuf>,
    /// JSON request body; read from stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lookup failed with status {0}")]
    Status(StatusCode),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Serve(args) => serve(args),
        CliCommand::Lookup(args) => lookup(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn serve(args: ServeArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_path)?;
    let _telemetry = telemetry::init(&config.common)?;
    let lookup_config = config.lookup_proxy.unwrap_or_default();

    tracing::info!(
        host = %lookup_config.listener.host,
        port = lookup_config.listener.port,
        "Starting lookup proxy"
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(lookup_proxy::run(lookup_config))?;
    Ok(())
}

/// Runs one request through the same dispatcher the HTTP listener uses.
fn lookup(args: LookupArgs) -> Result<(), CliError> {
    let config = match &args.config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let _telemetry = telemetry::init(&config.common)?;
    let lookup_config = config.lookup_proxy.unwrap_or_default();

    let body = match &args.input {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let mut request = Request::new(Bytes::from(body));
    *request.method_mut() = Method::POST;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = rt.block_on(async {
        let dispatcher = Dispatcher::from_config(&lookup_config)?;
        Ok::<_, LookupError>(dispatcher.handle(request).await)
    })?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(response.body())?;
    stdout.write_all(b"\n")?;

    match response.status().is_success() {
        true => Ok(()),
        false => Err(CliError::Status(response.status())),
    }
}
