//! Populate the default category tree.
//!
//! Safe to re-run: categories are matched by name and existing wallpaper
//! groups are left untouched.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallhub_db::seed::{seed_categories, DEFAULT_CATEGORIES};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallhub_db=debug,wallhub_seed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = wallhub_db::create_pool(&database_url)
        .await
        .context("failed to connect to database")?;

    wallhub_db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let summary = seed_categories(&pool, DEFAULT_CATEGORIES)
        .await
        .context("failed to seed categories")?;
    tracing::info!(
        main_categories = summary.main_categories,
        sub_categories = summary.sub_categories,
        "Seeded categories"
    );

    pool.close().await;
    Ok(())
}
