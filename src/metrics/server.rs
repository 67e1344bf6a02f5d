//! Prometheus exporter over HTTP.

use super::MetricsRegistry;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Errors that can occur while serving metrics.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("metrics server failed: {0}")]
    Serve(String),
}

/// Serves `/metrics` and `/health` for a shared registry.
///
/// Registry updates need no coordination with the server: counters are
/// atomic, and each scrape encodes whatever values are current.
pub struct MetricsServer {
    bind_addr: SocketAddr,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Creates a server for `registry` on `bind_addr`.
    pub fn new(bind_addr: SocketAddr, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            bind_addr,
            registry,
        }
    }

    /// Binds to `127.0.0.1:port`.
    pub fn loopback(port: u16, registry: Arc<MetricsRegistry>) -> Self {
        Self::new(([127, 0, 0, 1], port).into(), registry)
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Runs until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "Metrics server listening");

        axum::serve(listener, router(self.registry))
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))
    }
}

fn router(registry: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .route("/health", get(|| async { (StatusCode::OK, "OK") }))
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

async fn scrape(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    match registry.encode() {
        Ok(body) => (StatusCode::OK, [("content-type", TEXT_FORMAT)], body),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics encoding failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("failed to encode metrics: {e}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsSnapshot;

    async fn spawn(registry: Arc<MetricsRegistry>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(registry)).await.unwrap();
        });
        addr
    }

    #[test]
    fn test_loopback_addr() {
        let server = MetricsServer::loopback(9464, Arc::new(MetricsRegistry::new().unwrap()));
        assert!(server.bind_addr().ip().is_loopback());
        assert_eq!(server.bind_addr().port(), 9464);
    }

    #[tokio::test]
    async fn test_scrape_reflects_later_updates() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        let addr = spawn(Arc::clone(&registry)).await;

        registry.update(&MetricsSnapshot {
            captures: 4,
            ..Default::default()
        });

        let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
        assert!(response.status().is_success());
        let body = response.text().await.unwrap();
        assert!(body.contains("image_variations_captures_total 4"));
    }

    #[tokio::test]
    async fn test_health() {
        let addr = spawn(Arc::new(MetricsRegistry::new().unwrap())).await;
        let body = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }
}
