//! ByteBros API server
//! Catalog, news and support endpoints behind JWT authentication.

use anyhow::{Context, Result};
use bytebros_backend::{
    auth::{api::bootstrap_admin, BcryptHasher, JwtHandler},
    build_router,
    config::Config,
    store::Database,
    AppState,
};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("🚀 ByteBros backend starting");

    if config.jwt_secret.is_empty() {
        // The server still serves public routes; registration and login fail
        // with 500 and every gated route answers 401.
        error!("❌ JWT_SECRET is not set, tokens can be neither issued nor verified");
    } else if config.jwt_secret.len() < 32 {
        warn!("⚠️ JWT_SECRET is shorter than 32 bytes");
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    let hasher = Arc::new(BcryptHasher::new(config.bcrypt_cost)?);
    let jwt = Arc::new(JwtHandler::new(config.jwt_secret.clone()));
    info!("🔐 Authentication initialized (bcrypt cost {})", hasher.cost());

    let state = AppState::new(db.clone(), hasher, jwt);

    if let Some((email, password)) = config.bootstrap_admin() {
        bootstrap_admin(&state.auth, &db, email, password, &config.admin_name)
            .await
            .context("Failed to bootstrap administrator")?;
    } else if db.count_administrators()? == 0 {
        warn!("⚠️ No administrator exists; set ADMIN_EMAIL and ADMIN_PASSWORD to create one");
    }

    let app = build_router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bytebros_backend=debug,bytebros=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate root, for runs started from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received, draining connections");
}
