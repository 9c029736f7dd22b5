use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Selects which `.env.<environment>` file is loaded next to `.env`.
pub const ENVIRONMENT_ENV_VAR: &str = "LOGVAULT_ENV";
pub const DEFAULT_ENVIRONMENT: &str = "dev";

#[derive(Debug, Parser)]
#[command(name = "logvault-server")]
#[command(about = "Remote log ingestion and retrieval service")]
pub struct Cli {
    #[command(flatten)]
    pub config: ServerConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Provision the schema and serve the HTTP API (default).
    Serve,
    /// Manage the database schema without starting the server.
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum SchemaAction {
    /// Create the flag type and log table if missing.
    Apply,
    /// Drop the log table and flag type if present.
    Revert,
    /// Report which schema objects exist.
    Status,
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[arg(long, env = "LOGVAULT_DB", default_value = "logvault.sqlite", global = true)]
    pub db: PathBuf,

    /// Address to bind the HTTP listener to.
    #[arg(long, env = "LOGVAULT_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080, global = true)]
    pub port: u16,

    /// Requests per second allowed from one client address. 0 disables the
    /// limiter.
    #[arg(long, env = "LIMIT_RATE", default_value_t = 20.0, global = true)]
    pub limit_rate: f64,

    /// Upper bound for a single storage call, in milliseconds. 0 disables it.
    #[arg(
        long,
        env = "LOGVAULT_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        global = true
    )]
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

/// Load `.env.<environment>` and then `.env` from the working directory.
///
/// Variables already present in the process environment are never
/// overwritten, and the environment-specific file wins over `.env`. Missing
/// files are skipped. Returns the files that were loaded.
pub fn load_env_files() -> anyhow::Result<Vec<PathBuf>> {
    let environment = std::env::var(ENVIRONMENT_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    load_env_files_from(&std::env::current_dir()?, &environment)
}

/// Parent directories are not searched.
fn load_env_files_from(dir: &Path, environment: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut loaded = Vec::new();
    for name in [format!(".env.{environment}"), ".env".to_string()] {
        let path = dir.join(name);
        match dotenvy::from_path(&path) {
            Ok(()) => loaded.push(path),
            Err(err) if err.not_found() => {}
            Err(err) => {
                return Err(anyhow::anyhow!("failed to load {}: {err}", path.display()));
            }
        }
    }
    Ok(loaded)
}
