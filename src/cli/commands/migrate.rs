use anyhow::Context;

use crate::config::AppConfig;
use crate::database::{self, schema};

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = database::open(&config.db).context("opening database")?;
    schema::migrate(&pool).await.context("migrating schema")?;

    println!("migrations complete");
    Ok(())
}
