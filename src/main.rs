//! KiaKart Vendor Dashboard API
//! Mission: Serve vendor auth, catalog and orders over HTTP

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, time::interval};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kiakart_backend::{
    api::{create_router, AppState, RouterConfig},
    auth::{api::AuthState, JwtHandler, PasswordHasher, VendorStore},
    catalog::CatalogStore,
    config::Config,
    db::Database,
    middleware::{RateLimitConfig, RateLimitLayer},
    uploads::UploadStore,
};

const REVOCATION_PRUNE_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();
    config.validate()?;

    info!("🚀 KiaKart Vendor Dashboard API starting");

    let db = Database::open(&config.database_path)?;
    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let vendors = Arc::new(VendorStore::new(db.clone(), hasher)?);
    let catalog = Arc::new(CatalogStore::new(db));
    let uploads = Arc::new(UploadStore::new(&config.upload_dir)?);

    let previous_secrets = config.previous_secrets();
    let jwt_handler = Arc::new(JwtHandler::with_rotation(
        &config.jwt_secret,
        &previous_secrets,
        config.token_ttl(),
    )?);
    info!(
        "🔐 Authentication initialized ({} previous signing secret(s) accepted, token TTL {}h)",
        previous_secrets.len(),
        config.token_ttl_hours
    );

    let auth_limiter = RateLimitLayer::new(RateLimitConfig::new(
        config.auth_rate_limit,
        config.rate_limit_window(),
    ));

    tokio::spawn(revocation_pruning(jwt_handler.clone()));
    tokio::spawn(rate_limit_cleanup(
        auth_limiter.clone(),
        config.rate_limit_window(),
    ));

    let state = AppState {
        auth: AuthState::new(vendors, jwt_handler),
        catalog,
        uploads: uploads.clone(),
    };
    let app = create_router(
        state,
        RouterConfig {
            max_body_bytes: config.max_body_bytes,
            auth_limiter,
        },
    );

    info!("📁 Serving uploads from {}", uploads.root().display());

    // Start server
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("🎯 API server listening on {}", config.bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Drop revocation entries whose tokens have expired on their own
async fn revocation_pruning(jwt_handler: Arc<JwtHandler>) {
    let mut ticker = interval(Duration::from_secs(REVOCATION_PRUNE_SECS));
    loop {
        ticker.tick().await;
        let pruned = jwt_handler.prune_revocations();
        if pruned > 0 {
            debug!("🧹 Pruned {} expired token revocations", pruned);
        }
    }
}

async fn rate_limit_cleanup(limiter: RateLimitLayer, window: Duration) {
    let mut ticker = interval(window);
    loop {
        ticker.tick().await;
        let removed = limiter.cleanup();
        if removed > 0 {
            debug!("🧹 Dropped {} idle rate limit entries", removed);
        }
    }
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiakart_backend=debug,kiakart=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate root .env (when started from another directory)
    let candidate = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
