use std::net::SocketAddr;
use std::sync::Arc;

use skyfare_api::{
    app,
    state::{AppState, AuthConfig},
};
use skyfare_store::{Config, MemoryStore, PgStore, StoreBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration_seconds: config.auth.jwt_expiration_seconds,
    };

    let state = match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            AppState::new(store.clone(), store, auth)
        }
        StoreBackend::Postgres => {
            let url = config.store.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("store.database_url is required for the postgres backend")
            })?;
            let store = PgStore::connect(url, config.store.max_connections).await?;
            store.migrate().await?;
            tracing::info!("Connected to Postgres");
            let store = Arc::new(store);
            AppState::new(store.clone(), store, auth)
        }
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
