use std::sync::Arc;

use anyhow::Context;
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::{error, info, info_span};

use crate::auth::{Authenticator, StaticKeyLookup};
use crate::config::{AppConfig, AuthConfig};
use crate::database::{self, PgStore};
use crate::handlers::{self, ApiDeps};
use crate::middleware::Metrics;
use crate::server::{self, Server, ServerConfig, ShutdownEvents};

/// Start the API and diagnostics listeners and serve until shutdown.
pub async fn handle(config: AppConfig, build: &str) -> anyhow::Result<()> {
    let log = info_span!("service", service = "restaurant-api", build = %build);
    info!(parent: &log, ?config, "starting service");

    let authenticator = Arc::new(authenticator(&config.auth)?);
    let store = Arc::new(PgStore::new(database::open(&config.db).context("opening database")?));
    let metrics = Arc::new(Metrics::default());

    let (shutdown, events) = server::channel();
    server::listen_for_signals(shutdown.clone()).context("registering signal handlers")?;

    let server_config = ServerConfig {
        read_timeout: config.web.read_timeout,
        shutdown_timeout: config.web.shutdown_timeout,
    };

    // The diagnostics listener lives until the process exits.
    let debug_app = handlers::debug(build.to_string(), shutdown.clone(), log.clone(), Arc::clone(&metrics));
    let debug = Server::bind(&config.web.debug_host, debug_app.into_service(), server_config).await?;
    let debug_log = log.clone();
    tokio::spawn(async move {
        if let Err(err) = debug.run(ShutdownEvents::never()).await {
            error!(parent: &debug_log, error = %err, "debug listener closed");
        }
    });

    let token_ttl = chrono::Duration::from_std(config.auth.token_ttl).context("token ttl out of range")?;
    let api = handlers::api(ApiDeps {
        build: build.to_string(),
        shutdown,
        log: log.clone(),
        db: store,
        authenticator,
        metrics,
        request_timeout: config.web.write_timeout,
        token_ttl,
    });

    let server = Server::bind(&config.web.api_host, api.into_service(), server_config).await?;
    server.run(events).await?;

    info!(parent: &log, "shutdown complete");
    Ok(())
}

/// Load the key pair and check that tokens it signs verify.
fn authenticator(config: &AuthConfig) -> anyhow::Result<Authenticator> {
    let private_pem = std::fs::read(&config.private_key_file)
        .with_context(|| format!("reading auth private key {}", config.private_key_file))?;
    let public_pem = std::fs::read(&config.public_key_file)
        .with_context(|| format!("reading auth public key {}", config.public_key_file))?;

    let private_key = EncodingKey::from_rsa_pem(&private_pem).context("parsing auth private key")?;
    let public_key = DecodingKey::from_rsa_pem(&public_pem).context("parsing auth public key")?;

    let lookup = StaticKeyLookup::new().with_key(config.key_id.clone(), public_key);
    let authenticator = Authenticator::new(private_key, config.key_id.clone(), &config.algorithm, Arc::new(lookup))
        .context("constructing authenticator")?;

    Ok(authenticator)
}
