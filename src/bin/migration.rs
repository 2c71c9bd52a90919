//! Applies pending database migrations and exits.

use bookstore_api::{config, db, migrator::Migrator};
use sea_orm_migration::MigratorTrait;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    let pending = Migrator::get_pending_migrations(&pool).await?;
    info!(count = pending.len(), "applying pending migrations");

    Migrator::up(&pool, None).await?;
    info!("migrations complete");
    Ok(())
}
