use std::sync::Arc;

use anyhow::Context;

use pantry_api::app::build_app;
use pantry_api::config::Config;
use pantry_infra::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pantry_observability::init();

    let config = Config::from_env();

    let jwt_secret = config.jwt_secret.clone().unwrap_or_else(|| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let store: Arc<dyn InventoryStore> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            Arc::new(PostgresInventoryStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; falling back to the in-memory store");
            Arc::new(InMemoryInventoryStore::new())
        }
    };

    let app = build_app(store, &jwt_secret);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
