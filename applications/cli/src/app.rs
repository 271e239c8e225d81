/// Backend wiring for CLI commands
use crate::config::{BackendMode, EncoreConfig};
use anyhow::Context;
use encore_client::{ClientConfig, EncoreClient};
use encore_core::{MemoryBackend, TrackCatalog};
use encore_sync::{AppContext, Backend, LibraryView, TracingNotices};
use std::sync::Arc;
use tracing::{info, warn};

/// Account seeded into the in-memory backend
pub const DEMO_EMAIL: &str = "demo@encore.fm";
pub const DEMO_PASSWORD: &str = "encore-demo";

/// Build the application context for the configured backend and sign in
///
/// Memory mode always signs into the seeded demo account. Remote mode signs
/// in only when credentials are configured.
pub async fn connect(config: &EncoreConfig) -> anyhow::Result<AppContext> {
    let backend = match config.backend.mode {
        BackendMode::Memory => {
            let memory = Arc::new(MemoryBackend::new());
            memory
                .register(DEMO_EMAIL, DEMO_PASSWORD, Some("Demo Listener"))
                .await;
            info!("Using in-memory backend");
            Backend::memory(memory)
        }
        BackendMode::Remote => {
            let url = config.backend.url.clone().unwrap_or_default();
            let api_key = config.backend.api_key.clone().unwrap_or_default();
            let client = Arc::new(
                EncoreClient::new(ClientConfig::new(url, api_key))
                    .context("Failed to create backend client")?,
            );
            info!(url = %client.url(), "Using remote backend");
            Backend {
                store: client.clone(),
                objects: client.clone(),
                auth: client,
            }
        }
    };

    let app = AppContext::new(backend, TrackCatalog::demo(), Arc::new(TracingNotices));

    let credentials = match config.backend.mode {
        BackendMode::Memory => Some((DEMO_EMAIL, DEMO_PASSWORD)),
        BackendMode::Remote => config
            .auth
            .email
            .as_deref()
            .zip(config.auth.password.as_deref()),
    };

    match credentials {
        Some((email, password)) => {
            app.sign_in(email, password)
                .await
                .context("Sign in failed")?;
        }
        None => {
            warn!("No credentials configured (set ENCORE_AUTH__EMAIL and ENCORE_AUTH__PASSWORD)");
            app.refresh().await;
        }
    }

    Ok(app)
}

/// Fail early for commands that need a signed-in user
pub async fn require_library(app: &AppContext) -> anyhow::Result<()> {
    match app.library_view().await {
        LibraryView::SignInRequired => anyhow::bail!("Sign in required"),
        LibraryView::Ready { .. } => Ok(()),
    }
}
