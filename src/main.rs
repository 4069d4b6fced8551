// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::block_factory::{BlockFactory, TimestampIdGenerator};
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::dashboard_service::{DashboardService, EditorOptions};
use crate::application::notifications::NotificationHub;
use crate::domain::template::TemplateRegistry;
use crate::infrastructure::config::{StorageBackend, StorageSettings, load_app_config};
use crate::infrastructure::file_repository::FileDashboardRepository;
use crate::infrastructure::memory_repository::InMemoryDashboardRepository;
use crate::infrastructure::rest_repository::RestDashboardRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;

async fn build_repository(storage: &StorageSettings) -> anyhow::Result<Arc<dyn DashboardRepository>> {
    let repository: Arc<dyn DashboardRepository> = match storage.backend {
        StorageBackend::File => Arc::new(FileDashboardRepository::new(&storage.dir).await?),
        StorageBackend::Memory => Arc::new(InMemoryDashboardRepository::default()),
        StorageBackend::Rest => {
            let base_url = storage
                .base_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("storage.base_url is required for the rest backend"))?;
            Arc::new(RestDashboardRepository::new(
                base_url,
                storage.token.clone(),
                Duration::from_secs(storage.timeout_secs),
            )?)
        }
    };
    Ok(repository)
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/templates", get(handlers::list_templates))
        .route("/templates/:id", get(handlers::get_template))
        .route(
            "/dashboards",
            get(handlers::list_dashboards).post(handlers::create_dashboard),
        )
        .route(
            "/dashboards/:id",
            get(handlers::get_dashboard)
                .patch(handlers::update_details)
                .delete(handlers::delete_dashboard),
        )
        .route("/dashboards/:id/close", post(handlers::close_dashboard))
        .route("/dashboards/:id/blocks", post(handlers::add_block))
        .route(
            "/dashboards/:id/blocks/:block_id",
            axum::routing::patch(handlers::update_block).delete(handlers::delete_block),
        )
        .route(
            "/dashboards/:id/blocks/:block_id/duplicate",
            post(handlers::duplicate_block),
        )
        .route(
            "/dashboards/:id/blocks/:block_id/position",
            post(handlers::reposition_block),
        )
        .route("/dashboards/:id/reorder", post(handlers::reorder_blocks))
        .route("/dashboards/:id/paste", post(handlers::paste_blocks))
        .route("/dashboards/:id/select", post(handlers::select_block))
        .route("/dashboards/:id/grid", get(handlers::responsive_grid))
        .route(
            "/dashboards/:id/grid/:breakpoint",
            post(handlers::grid_layout_change),
        )
        .route("/dashboards/:id/export", get(handlers::export_dashboard))
        .route("/dashboards/:id/import", post(handlers::import_dashboard))
        .route("/dashboards/:id/save", post(handlers::save_dashboard))
        .route("/events", get(handlers::stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = build_repository(&config.storage).await?;
    tracing::info!(backend = ?config.storage.backend, "dashboard storage ready");

    // Create services (application layer)
    let registry = Arc::new(TemplateRegistry::builtin());
    let factory = BlockFactory::new(registry, Arc::new(TimestampIdGenerator::default()));
    let dashboard_service = DashboardService::new(
        repository,
        factory,
        NotificationHub::new(),
        EditorOptions {
            autosave_window: config.editor.autosave_window(),
        },
    );

    // Create application state
    let state = Arc::new(AppState { dashboard_service });

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Starting dashboard-editor service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
