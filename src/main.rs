use std::sync::Arc;

use anyhow::Context;
use newbridge_onboarding::address::MockAddressBook;
use newbridge_onboarding::app_router;
use newbridge_onboarding::config::AppConfig;
use newbridge_onboarding::store::{Database, LibSqlBackend};
use newbridge_onboarding::wizard::{FormStore, StubIntake, WizardShell};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("NewBridge onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Wizard API: http://0.0.0.0:{}/api/onboarding/status", config.port);
    eprintln!("   Address lookup: http://0.0.0.0:{}/api/address-lookup?query=", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("failed to open database at {}", config.db_path.display()))?,
    );
    tracing::info!(path = %config.db_path.display(), "Database ready");

    // ── Wizard ───────────────────────────────────────────────────────────
    let intake = Arc::new(StubIntake::new(config.intake_delay));
    let store = Arc::new(FormStore::init(Arc::clone(&db), intake, config.store.clone()).await?);
    let shell = Arc::new(WizardShell::new(Arc::clone(&store)));
    let lookup = Arc::new(MockAddressBook::new(config.lookup_latency));

    let app = app_router(shell, lookup);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Onboarding server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    // The router held the other shell/store clones; they are gone after serve returns.
    match Arc::try_unwrap(store) {
        Ok(store) => store.dispose().await?,
        Err(_) => tracing::warn!("Form store still shared at shutdown, skipping final snapshot"),
    }
    Ok(())
}
