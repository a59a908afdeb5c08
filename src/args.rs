use std::{
    env,
    fs::{self, File},
    io,
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{ensure, Context as _, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted when `--token-file` is absent.
const TOKEN_ENV: &str = "NOWPLAYD_TOKEN";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// How playback changes are learned from the provider
    #[clap(long, value_enum, default_value_t = SyncStrategy::Poll)]
    pub strategy: SyncStrategy,
    /// Query the provider every X seconds --- only used with `--strategy poll`
    #[clap(long, short, default_value_t = 5.0)]
    pub refresh_every: f64,
    /// Base URL of the provider's REST API
    #[clap(long, default_value = "https://api.spotify.com/v1")]
    pub api_url: String,
    /// URL of the provider's NDJSON event stream
    /// --- only used with `--strategy push`
    #[clap(long)]
    pub events_url: Option<String>,
    /// Token revocation endpoint called on `logout`
    #[clap(long)]
    pub revoke_url: Option<String>,
    /// File containing the OAuth access token. Falls back to $NOWPLAYD_TOKEN.
    #[clap(long, short)]
    pub token_file: Option<PathBuf>,
    /// Run against a canned provider without contacting any network service
    #[clap(long)]
    pub demo: bool,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SyncStrategy {
    Poll,
    Push,
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Panics
    ///
    /// Panics if the log file cannot be opened.
    pub fn init_tracing_subscriber(&self) {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => builder
                .with_writer(Mutex::new(File::create(f).unwrap()))
                .init(),
        }
    }

    /// Read the provider access token. Without one there is no session to
    /// run, so failure here is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a readable token file nor the
    /// environment variable yields a non-empty token.
    pub fn access_token(&self) -> Result<String> {
        let token = match self.token_file.as_ref() {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read token file {}", path.display()))?,
            None => env::var(TOKEN_ENV)
                .with_context(|| format!("No token file given and ${TOKEN_ENV} is unset"))?,
        };
        let token = token.trim().to_owned();
        ensure!(!token.is_empty(), "Provider access token is empty");
        Ok(token)
    }
}
