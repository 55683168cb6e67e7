use std::net::SocketAddr;
use std::sync::Arc;

use atelier_backend::{
    config::{get_config, init_config},
    database::{
        pool::{create_pool, run_migrations},
        PgStore,
    },
    routes, AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    init_config()?;
    let config = get_config()?;

    let app_state = if config.database_url.is_some() {
        let pool = create_pool(config).await?;
        run_migrations(&pool).await?;
        info!("Connected to Postgres, migrations applied");
        let store = Arc::new(PgStore::new(pool));
        AppState::new(store.clone(), store.clone(), store, config)
    } else {
        warn!("DATABASE_URL is not set; using the in-memory store, data will not survive a restart");
        AppState::in_memory(config)
    };

    let app = routes::router(app_state, config);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
