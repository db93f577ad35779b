mod config;
mod db;
mod rate_limit;
mod routes;
mod rpc;
mod services;
mod state;

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    if config.mode.is_production() && !config.cookie_secure {
        tracing::warn!("production mode with insecure session cookies; set COOKIE_SECURE or use an https AUTH_URL");
    }

    let pool = match db::init_pool(&config.database_url, config.db_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "database init failed");
            std::process::exit(1);
        }
    };
    let _reaper = services::session::spawn_reaper(pool.clone());

    let port = config.port;
    let backends = state::Backends::production(&pool, &config);
    let state = state::AppState::new(config, backends);
    let app = routes::app(state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%port, "starter listening");
    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
