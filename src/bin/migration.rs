use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use storefront_promotions::{config, db, migrator::Migrator};
use tracing::info;

/// Applies or rolls back the promotions schema.
///
/// Usage: `migration [up|down|status]` (default `up`). The database URL comes
/// from `DATABASE_URL` when set, otherwise from the layered app config.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let action = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            config::load_config()
                .context("failed to load configuration")?
                .database_url
        }
    };

    info!("Starting database migration ({})", action);
    let pool = db::establish_connection(&database_url)
        .await
        .context("failed to connect to the database")?;

    match action.as_str() {
        "up" => db::run_migrations(&pool).await?,
        "down" => {
            Migrator::down(&pool, Some(1))
                .await
                .context("rollback failed")?;
            info!("Rolled back the latest migration");
        }
        "status" => Migrator::status(&pool).await.context("status failed")?,
        other => anyhow::bail!("unknown action '{}', expected up, down or status", other),
    }

    info!("Migration completed successfully");
    Ok(())
}
