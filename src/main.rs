use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use club_recruit_client::auth::{CredentialStore, MemoryStore, SessionManager, SqliteStore};
use club_recruit_client::commands;
use club_recruit_client::config::{CliArgs, Config, LogFormat};
use club_recruit_client::http_client::ApiClient;
use club_recruit_client::navigation::CliNavigator;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    init_logging(&config);
    tracing::debug!(
        api = %config.api_base_url,
        refresh = %config.refresh_url,
        "Configuration loaded"
    );

    let store: Arc<dyn CredentialStore> = if config.ephemeral {
        tracing::debug!("Using in-memory credential store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&config.credentials_db).with_context(|| {
            format!(
                "Failed to open credential store at {}",
                config.credentials_db.display()
            )
        })?)
    };

    let session = Arc::new(SessionManager::new(store));
    let state = session.init()?;
    tracing::debug!(authenticated = state.is_authenticated(), "Session restored");

    let client = ApiClient::new(config.client_options(), session, Arc::new(CliNavigator))?;

    commands::run(args.command, &client).await
}

fn init_logging(config: &Config) {
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
