use clap::Parser;
use tracing_subscriber::EnvFilter;

use restaurant_api::cli::{self, Cli};

/// Build identifier reported by health and diagnostics.
const BUILD: &str = match option_env!("RESTAURANT_BUILD") {
    Some(build) => build,
    None => env!("CARGO_PKG_VERSION"),
};

#[tokio::main]
async fn main() {
    // Load .env if present so local runs pick up RESTAURANT_* settings.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli, BUILD).await {
        tracing::error!(error = ?err, "shutting down");
        std::process::exit(1);
    }
}
