//! Image relay: accepts a single image over multipart upload, stores it in a
//! GCS bucket under the caller's object name and returns its public URL.
//!
//! Non-API paths are served from a static site directory. See [`config`] for
//! the environment variables.

mod config;
mod constants;
mod routes;
mod services;
mod storage;
#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use storage::{GcsStore, LocalStore, ObjectStore};

/// Shared, read-only for the life of the process.
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
}

/// Uses `RUST_LOG` if set, otherwise the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    if let Some(ref path) = config.local_storage_path {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("failed to create {path:?}"))?;
        return Ok(Arc::new(LocalStore::new(
            path.clone(),
            &config.local_public_base_url,
        )));
    }

    // GCS client uses GOOGLE_APPLICATION_CREDENTIALS or the metadata server
    let gcs = GcsStore::connect(&config.bucket_name, &config.public_base_url)
        .await
        .context("failed to create GCS client")?;
    Ok(Arc::new(gcs))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level)?;

    let store = build_store(&config).await?;
    info!("Storage backend: {}", store.describe());

    if !config.static_dir.is_dir() {
        warn!("Static directory {:?} not found; non-API paths will 404", config.static_dir);
    }

    let state = Arc::new(AppState { store });
    let media_dir = config.local_storage_path.as_deref();
    let app = routes::build_app(state, &config.static_dir, media_dir);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("Image relay listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("received shutdown signal");
        })
        .await
        .context("server failed")?;
    Ok(())
}
