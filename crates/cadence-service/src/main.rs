use std::sync::Arc;

use jiff::Timestamp;
use tracing_subscriber::EnvFilter;

use cadence_backend::backend::Backend;
use cadence_backend::http::HttpBackend;
use cadence_backend::memory::MemoryBackend;
use cadence_backend::poll::spawn_poll;
use cadence_backend::session::{SessionContext, SessionStore};
use cadence_service::config::{BackendKind, ServiceConfig};
use cadence_service::scheduler::Scheduler;
use cadence_service::state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Structured JSON logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ServiceConfig::from_env()?;
    let backend = build_backend(&config).await?;

    let scheduler = Arc::new(Scheduler::new(backend, config.time_zone.clone()));

    let sweeper = scheduler.clone();
    let sweep = spawn_poll("sweep", config.sweep_interval, move || {
        let scheduler = sweeper.clone();
        async move {
            if let Err(e) = scheduler.sweep(Timestamp::now()).await {
                tracing::error!(error = %e, "sweep failed");
            }
        }
    });

    let app = cadence_service::router(AppState::new(scheduler, &config.jwt_secret));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        time_zone = config.time_zone.iana_name().unwrap_or("fixed"),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "cadence service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep.join().await;
    tracing::info!("cadence service stopped");
    Ok(())
}

async fn build_backend(config: &ServiceConfig) -> eyre::Result<Arc<dyn Backend>> {
    match &config.backend {
        BackendKind::Memory => {
            tracing::info!("using in-memory backend");
            Ok(Arc::new(MemoryBackend::new()))
        }
        BackendKind::Http {
            base_url,
            credentials,
            session_file,
        } => {
            let store = match session_file {
                Some(path) => SessionStore::at(path),
                None => SessionStore::default_location()?,
            };
            let session = Arc::new(SessionContext::with_store(store)?);
            let backend = HttpBackend::new(base_url.clone(), config.http_timeout, session.clone());

            if !session.is_active() {
                match credentials {
                    Some(credentials) => {
                        backend.login(&credentials.email, &credentials.password).await?;
                    }
                    None => tracing::warn!("no stored session and no credentials configured"),
                }
            }

            tracing::info!(base_url = %base_url, "using HTTP backend");
            Ok(Arc::new(backend))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
