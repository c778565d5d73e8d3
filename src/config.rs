use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;

use crate::commands::Command;
use crate::http_client::{ClientOptions, DEFAULT_BASE_URL, DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_URL};

/// Club Recruit - command-line client for the club recruitment API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the API (relative paths are joined to it)
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,

    /// Token refresh endpoint
    #[arg(long, env = "API_REFRESH_URL", default_value = DEFAULT_REFRESH_URL, global = true)]
    pub refresh_url: String,

    /// Path to the credential database
    #[arg(short = 'd', long, env = "CREDENTIALS_DB", global = true)]
    pub db_file: Option<String>,

    /// Keep the session in memory only
    #[arg(long, env = "CREDENTIALS_EPHEMERAL", global = true)]
    pub ephemeral: bool,

    /// Login entry point used when a session has to be abandoned
    #[arg(long, env = "LOGIN_PATH", default_value = DEFAULT_LOGIN_PATH, global = true)]
    pub login_path: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30", global = true)]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "300", global = true)]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug)]
pub struct Config {
    // API endpoints
    pub api_base_url: String,
    pub refresh_url: String,
    pub login_path: String,

    // Credential storage
    pub credentials_db: PathBuf,
    pub ephemeral: bool,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Build configuration from parsed arguments (CLI > ENV > defaults)
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let credentials_db = match args.db_file {
            Some(ref path) => expand_tilde(path),
            None => default_credentials_db()
                .context("Cannot determine a data directory; set CREDENTIALS_DB")?,
        };

        Ok(Config {
            api_base_url: args.api_url.clone(),
            refresh_url: args.refresh_url.clone(),
            login_path: args.login_path.clone(),
            credentials_db,
            ephemeral: args.ephemeral,
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level.clone(),
            log_format: parse_log_format(&args.log_format),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_http_url("API_BASE_URL", &self.api_base_url)?;
        validate_http_url("API_REFRESH_URL", &self.refresh_url)?;

        if !self.login_path.starts_with('/') {
            anyhow::bail!("LOGIN_PATH must start with '/': {}", self.login_path);
        }

        if self.http_connect_timeout == 0 || self.http_request_timeout == 0 {
            anyhow::bail!("HTTP timeouts must be greater than zero");
        }

        Ok(())
    }

    /// Settings for the API client
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_base_url.clone(),
            refresh_url: self.refresh_url.clone(),
            login_path: self.login_path.clone(),
            connect_timeout: self.http_connect_timeout,
            request_timeout: self.http_request_timeout,
        }
    }
}

fn validate_http_url(name: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("{} is not a valid URL: {}", name, raw))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("{} must use http or https, got {}", name, other),
    }
}

/// Default credential database under the user's data directory
fn default_credentials_db() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("club-recruit").join("session.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse log format from string
fn parse_log_format(s: &str) -> LogFormat {
    match s.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
