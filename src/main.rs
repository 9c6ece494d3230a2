//! Casa Commerce - storefront API server

use anyhow::{Context, Result};
use casa_commerce::config::{Config, StorageConfig};
use casa_commerce::http::{self, AppState};
use casa_commerce::repository::{postgres, Repositories};
use casa_commerce::services::{Services, TokenService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let repos = match &config.storage {
        StorageConfig::Postgres { database_url, max_connections } => {
            let pool = postgres::create_pool(database_url, *max_connections).await.context("connecting to PostgreSQL")?;
            postgres::run_migrations(&pool).await.context("running migrations")?;
            tracing::info!(max_connections, "using PostgreSQL storage");
            Repositories::postgres(pool)
        }
        StorageConfig::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            Repositories::in_memory()
        }
    };

    let services = Services::new(repos.clone(), TokenService::new(config.jwt_secret.clone(), config.token_ttl_days));

    if config.seed_on_startup && repos.products.count().await? == 0 {
        let inserted = services.seed.seed_products().await?;
        tracing::info!(inserted, "seeded empty catalog");
    }

    let app = http::router(AppState::new(services));

    let addr = config.socket_addr();
    tracing::info!("Casa Commerce listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
