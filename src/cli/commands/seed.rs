use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::database::{self, schema, PgStore};

/// Hashing two passwords dominates, so allow far more than a request gets.
const SEED_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = database::open(&config.db).context("opening database")?;
    let store = PgStore::new(pool);

    schema::seed(&store, Utc::now(), Instant::now() + SEED_TIMEOUT)
        .await
        .context("seeding database")?;

    println!("seed data complete");
    Ok(())
}
