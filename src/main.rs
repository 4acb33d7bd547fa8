//! EstateFlow API - Real-estate CRM platform
//!
//! Serves the authentication and access-control core: login with
//! brute-force lockout, session cookies and bearer tokens, role-based
//! authorization, and admin impersonation with audit logging.

use estateflow_api::config::Settings;
use estateflow_api::routes::create_router;
use estateflow_api::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting EstateFlow API - CRM auth core...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    if settings.uses_dev_secret() {
        warn!("⚠️  JWT_SECRET not set, using default (INSECURE - set in production!)");
    }

    // Build application state; every auth component is injected here
    let state = Arc::new(AppState::new(&settings.auth));

    // Seed a platform admin so a fresh instance is reachable
    state.users.init_default_admin().await?;
    info!("✅ Default admin provisioned (username: admin)");

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Authentication ───");
    info!("   POST /api/auth/login         - Login with username/password");
    info!("   POST /api/auth/logout        - Destroy the current session");
    info!("   GET  /api/auth/me            - Resolve the current identity");
    info!("");
    info!("   ─── Platform Administration ───");
    info!("   POST /api/auth/impersonate   - Impersonate a user (admin only)");
    info!("   GET  /api/auth/audit         - Audit log (admin only)");
    info!("   GET  /api/users              - List users (admin only)");
    info!("   PUT  /api/users/:id/roles    - Change role set (admin only)");
    info!("   PUT  /api/users/:id/active   - (De)activate account (admin only)");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,estateflow_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
