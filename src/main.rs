use anyhow::Context;
use concierge::{cli::config_path_from_args, config::Config, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let logging_guard = logging::init_tracing(&config.logging)?;
    tracing::info!(
        target: "server",
        run_id = %logging_guard.run_id(),
        config = %config_path.display(),
        "concierge starting"
    );

    server::run(config).await
}
