pub mod auth;
pub mod error;
pub mod handlers;

use crate::core::engine::CollectionEngine;
use crate::core::{LeadRepository, PlacesProvider};
use crate::utils::error::Result;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct AppState<P: PlacesProvider, R: LeadRepository> {
    pub engine: Arc<CollectionEngine<P, R>>,
    pub list_limit: usize,
    pub minimum_tier: String,
}

// derive(Clone) exigiria P: Clone e R: Clone
impl<P: PlacesProvider, R: LeadRepository> Clone for AppState<P, R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            list_limit: self.list_limit,
            minimum_tier: self.minimum_tier.clone(),
        }
    }
}

impl<P, R> AppState<P, R>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    pub fn new(engine: CollectionEngine<P, R>, list_limit: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            list_limit,
            minimum_tier: "basico".to_string(),
        }
    }

    pub fn with_minimum_tier(mut self, tier: &str) -> Self {
        self.minimum_tier = tier.to_string();
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        self.engine.repository()
    }
}

pub fn router<P, R>(state: AppState<P, R>) -> Router
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/crm/acesso", get(handlers::access_summary::<P, R>))
        .route("/crm/coletar", post(handlers::submit_collection::<P, R>))
        .route("/crm/coletas", get(handlers::list_batches::<P, R>))
        .route("/crm/leads", get(handlers::list_leads::<P, R>))
        .route(
            "/crm/leads/stream/:coleta_id",
            get(handlers::stream_leads::<P, R>),
        )
        .route("/crm/leads/exportar/csv", get(handlers::export_csv::<P, R>))
        .route("/crm/leads/exportar/xlsx", get(handlers::export_xlsx::<P, R>))
        .with_state(state)
}

/// Serve a API até receber Ctrl+C. Coletas em andamento são abandonadas.
pub async fn serve<P, R>(listener: TcpListener, state: AppState<P, R>) -> Result<()>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🌐 Listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("⚠️ Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
