//! sky - Post to Bluesky from the command line

mod escape;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use libskypost::config::Config;
use libskypost::error::ConfigError;
use libskypost::logging::{LogFormat, LoggingConfig};
use libskypost::poster::validate_content;
use libskypost::{
    Credentials, FileSessionStore, PostSubmitter, Result, Session, SessionManager, SessionState,
    SessionStore, XrpcClient, XrpcHandleResolver,
};

#[derive(Parser, Debug)]
#[command(name = "sky")]
#[command(about = "Post to Bluesky from the command line", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: $SKYPOST_CONFIG or ~/.config/skypost/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (text, json or pretty)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store a new session
    Create {
        /// Bluesky handle (@handle.bsky.social)
        handle: String,

        /// App password (prompted for when omitted on a terminal)
        #[arg(long, env = "BLUESKY_APP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Post a message; \n, \t and friends are interpreted
    Post {
        /// Message to post
        message: String,

        /// Bluesky handle (optional, defaults to the first stored session)
        #[arg(short = 'u', long)]
        handle: Option<String>,
    },

    /// Exchange the stored refresh token for new tokens
    Refresh {
        /// Bluesky handle (@handle.bsky.social)
        handle: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env(cli.verbose);
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    logging.init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let client = XrpcClient::from_config(&config.service)?;
    let store = FileSessionStore::from_config(&config.store);

    match cli.command {
        Commands::Create { handle, password } => create(client, &store, handle, password).await,
        Commands::Post { message, handle } => post(client, &store, message, handle).await,
        Commands::Refresh { handle } => refresh(client, &store, handle).await,
    }
}

async fn create(
    client: XrpcClient,
    store: &dyn SessionStore,
    handle: String,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password(&handle)?,
    };

    let credentials = Credentials::new(handle, password);
    let session = SessionManager::new(client)
        .create_session(&credentials)
        .await?;
    let path = store.save(&session)?;

    print_session(&session);
    println!("Saved to: {}", path.display());
    Ok(())
}

async fn post(
    client: XrpcClient,
    store: &dyn SessionStore,
    message: String,
    handle: Option<String>,
) -> Result<()> {
    let message = escape::unescape(&message)?;
    validate_content(&message)?;

    let session = store.load(handle.as_deref())?;
    if session.state(Utc::now()) == SessionState::Expired {
        tracing::warn!(
            "Access token for {} has expired; run `sky refresh {}` first",
            session.handle,
            session.handle
        );
    }

    println!("Posting message: {}", message);
    println!("Using handle: {}", session.handle);

    let resolver = XrpcHandleResolver::new(client.clone());
    let outcome = PostSubmitter::new(client, resolver)
        .submit(&message, &session)
        .await?;

    println!("Response Status: {}", outcome.status);
    println!("Response Body: {}", outcome.body);
    outcome.into_result()?;
    Ok(())
}

async fn refresh(client: XrpcClient, store: &dyn SessionStore, handle: String) -> Result<()> {
    let current = store.load(Some(&handle))?;
    println!("Using handle: {}", current.handle);

    let session = SessionManager::new(client)
        .refresh_session(&current.refresh_token)
        .await?;
    store.save(&session)?;

    print_session(&session);
    Ok(())
}

fn prompt_password(handle: &str) -> Result<String> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(ConfigError::MissingField(
            "password (use --password or BLUESKY_APP_PASSWORD when not on a terminal)"
                .to_string(),
        )
        .into());
    }

    let prompt = format!("App password for {}: ", handle);
    let password = rpassword::prompt_password(prompt).map_err(ConfigError::ReadError)?;
    if password.is_empty() {
        return Err(ConfigError::MissingField("password".to_string()).into());
    }
    Ok(password)
}

fn print_session(session: &Session) {
    println!("Handle: {}", session.handle);
    println!("DID: {}", session.did);
    if let Some(expires_at) = session.access_expires_at() {
        println!("Access token expires: {}", expires_at.to_rfc3339());
    }
}
