use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bank_customer_admin::cli::{self, Cli};
use bank_customer_admin::config::Config;

/// Main entry point for the `bank-admin` console.
///
/// Initializes logging (stderr, so command output stays clean), loads the
/// configuration, and dispatches the requested command.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bank_customer_admin=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    cli::run(cli, &config).await
}
