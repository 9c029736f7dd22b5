mod error;
mod handlers;
mod http;
mod rate_limit;

pub mod config;

use std::sync::Arc;

use logvault_service::LogService;
use logvault_state::LogRuntime;
use logvault_state::LogStore;
use logvault_state::SchemaState;
use tokio::net::TcpListener;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use http::router;
pub use rate_limit::RateLimit;

use crate::config::Cli;
use crate::config::Command;
use crate::config::SchemaAction;
use crate::config::ServerConfig;

/// Used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "logvault_server=info,logvault_service=info,logvault_state=info";

/// Install the stderr `fmt` subscriber. Safe to call more than once.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(&cli.config).await,
        Command::Schema { action } => run_schema(&cli.config, action).await,
    }
}

async fn run_server(config: &ServerConfig) -> anyhow::Result<()> {
    let runtime = LogRuntime::open(config.db.clone()).await?;
    // The listener still comes up so the health endpoint answers.
    if let Err(err) = runtime.provision_schema().await {
        error!("schema provisioning failed: {err:#}");
    }

    let store: Arc<dyn LogStore> = runtime;
    let mut service = LogService::new(store);
    if let Some(timeout) = config.request_timeout() {
        service = service.with_request_timeout(timeout);
    }

    let rate_limit = RateLimit::per_second(config.limit_rate);
    if rate_limit.is_none() {
        info!("rate limiting disabled");
    }

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    http::serve(listener, service, rate_limit).await
}

async fn run_schema(config: &ServerConfig, action: SchemaAction) -> anyhow::Result<()> {
    let runtime = LogRuntime::open(config.db.clone()).await?;
    match action {
        SchemaAction::Apply => {
            runtime.provision_schema().await?;
            info!("schema applied to {}", runtime.db_path().display());
        }
        SchemaAction::Revert => {
            runtime.revert_schema().await?;
            info!("schema reverted on {}", runtime.db_path().display());
        }
        SchemaAction::Status => {
            let state = runtime.schema_state().await?;
            print_schema_state(&runtime, state);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_schema_state(runtime: &LogRuntime, state: SchemaState) {
    println!("database: {}", runtime.db_path().display());
    println!("flag type: {}", present(state.flag_type));
    println!("log table: {}", present(state.log_table));
}

fn present(exists: bool) -> &'static str {
    if exists { "present" } else { "missing" }
}
