//! ogna - sign in to an ogna service once and call its API from the shell.
//!
//! The session is kept in `~/.cache/ogna` (a cookie jar and a token store), so
//! later invocations reuse it until it expires or you log out. Every command
//! prints a `{data, error}` JSON envelope and exits non-zero on error.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ogna_core::{
    ApiResult, ClientConfig, Config, Method, OgnaClient, Persistence, RequestOptions,
    ResultEnvelope,
};
use serde_json::Value;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ogna")]
#[command(about = "Session-aware command-line client for ogna services")]
struct Cli {
    /// Service base URL (defaults to the last one used)
    #[arg(long, env = "OGNA_BASE_URL")]
    base_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Keep the session in memory only; nothing is read from or written to disk
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login(CredentialArgs),
    /// Create an account and sign in
    Signup(CredentialArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Print the signed-in user
    Whoami,
    /// Print the current access token
    Token,
    /// GET {base}/api/{path}
    Get(RequestArgs),
    /// POST {base}/api/{path}
    Post(BodyRequestArgs),
    /// PUT {base}/api/{path}
    Put(BodyRequestArgs),
    /// DELETE {base}/api/{path}
    Delete(RequestArgs),
}

#[derive(clap::Args)]
struct CredentialArgs {
    /// Account email (prompted when omitted)
    email: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(long, env = "OGNA_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(clap::Args)]
struct RequestArgs {
    path: String,

    /// Extra header, as "Name: value"
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

#[derive(clap::Args)]
struct BodyRequestArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// JSON request body
    #[arg(short, long, default_value = "{}")]
    data: String,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref())?;

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let base_url = cli
        .base_url
        .clone()
        .or_else(|| config.base_url.clone())
        .context("No base URL: pass --base-url or set OGNA_BASE_URL")?;
    let client_config = ClientConfig::new(base_url).apply_env()?;
    // Sessions are stored per origin
    config.base_url = Some(client_config.base_url.clone());

    let persistence = if cli.ephemeral {
        Persistence::Ephemeral
    } else {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Session directory configured");
        Persistence::file(cache_dir)?
    };

    let mut client = OgnaClient::new(client_config, persistence)?;
    info!(base_url = client.base_url(), logged_in = client.is_logged_in(), "Client ready");

    let ok = match cli.command {
        Command::Login(args) => {
            let (email, password) = credentials(args, config.last_email.as_deref())?;
            let result = client.login(&email, &password).await;
            if result.is_ok() {
                remember(&mut config, &client, email);
            }
            emit(result)?
        }
        Command::Signup(args) => {
            let (email, password) = credentials(args, config.last_email.as_deref())?;
            let result = client.signup(&email, &password).await;
            if result.is_ok() {
                remember(&mut config, &client, email);
            }
            emit(result)?
        }
        Command::Logout => emit(client.logout().await)?,
        Command::Status => emit(Ok(serde_json::json!({
            "base_url": client.base_url(),
            "state": format!("{:?}", client.state()),
            "logged_in": client.is_logged_in(),
            "user": client.user().map(|u| u.display_name()),
            "expires_in_minutes": client.session().and_then(|s| s.minutes_until_expiry()),
        })))?,
        Command::Whoami => emit(
            client
                .user()
                .cloned()
                .ok_or(ogna_core::ClientError::NotSignedIn),
        )?,
        Command::Token => emit(client.token().ok_or(ogna_core::ClientError::NoToken))?,
        Command::Get(args) => emit(call(&client, Method::Get, args, None).await?)?,
        Command::Delete(args) => emit(call(&client, Method::Delete, args, None).await?)?,
        Command::Post(args) => {
            let body = parse_body(&args.data)?;
            emit(call(&client, Method::Post, args.request, Some(body)).await?)?
        }
        Command::Put(args) => {
            let body = parse_body(&args.data)?;
            emit(call(&client, Method::Put, args.request, Some(body)).await?)?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn call(
    client: &OgnaClient,
    method: Method,
    args: RequestArgs,
    body: Option<Value>,
) -> Result<ApiResult<Value>> {
    let mut options = RequestOptions::new();
    for raw in &args.headers {
        let (name, value) = raw
            .split_once(':')
            .with_context(|| format!("Invalid header {:?}, expected \"Name: value\"", raw))?;
        options = options.header(name.trim(), value.trim());
    }
    Ok(client
        .request(method, &args.path, body.as_ref(), &options)
        .await)
}

fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Request body must be valid JSON")
}

/// Print the result envelope; returns whether the call succeeded.
fn emit<T: serde::Serialize>(result: ApiResult<T>) -> Result<bool> {
    let envelope = ResultEnvelope::from(result);
    let ok = envelope.is_ok();
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(ok)
}

fn remember(config: &mut Config, client: &OgnaClient, email: String) {
    config.base_url = Some(client.base_url().to_string());
    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

fn credentials(args: CredentialArgs, last_email: Option<&str>) -> Result<(String, String)> {
    let email = match args.email {
        Some(email) => email,
        None => prompt_email(last_email)?,
    };
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    Ok((email, password))
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    match (input.is_empty(), last_email) {
        (true, Some(last)) => Ok(last.to_string()),
        (true, None) => Err(anyhow::anyhow!("Email is required")),
        (false, _) => Ok(input.to_string()),
    }
}
