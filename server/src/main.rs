use clap::Parser;
use logvault_server::config::Cli;
use logvault_server::config::load_env_files;
use logvault_server::init_tracing;
use logvault_server::run_main;

fn main() -> anyhow::Result<()> {
    // Env files mutate the process environment, so load them before any
    // runtime threads exist and before clap reads its env fallbacks.
    let loaded = load_env_files()?;
    let cli = Cli::parse();
    init_tracing();
    for path in &loaded {
        tracing::debug!("loaded environment from {}", path.display());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_main(cli))
}
