use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use derive_new::new;
use eyre::{Result, WrapErr};

use crate::Scraper;

/// A server that serves the exporter routes
#[derive(new, Debug)]
pub struct Server {
    listen_port: u16,
    scraper: Arc<Scraper>,
}

impl Server {
    /// Bind the listen port and serve until the process exits.
    ///
    /// routes:
    ///  - metrics - runs every collector and serves the Prometheus text
    ///    exposition on `/metrics`
    ///  - healthz - liveness probe on `/healthz`, never touches an upstream
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let port = self.listen_port;
        let url = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&url)
            .await
            .wrap_err_with(|| format!("Failed to bind to TCP port {port}"))?;
        tracing::info!(port, "starting server on 0.0.0.0");

        axum::serve(listener, self.router())
            .await
            .wrap_err("Metrics server stopped")
    }

    /// The router behind [`Server::run`].
    pub fn router(&self) -> Router {
        let scraper = self.scraper.clone();
        Router::new()
            .route("/metrics", get(move || Self::gather_metrics(scraper)))
            .route("/healthz", get(|| async { (StatusCode::OK, "OK") }))
    }

    /// Scrape every collector and encode the registry as plaintext.
    async fn gather_metrics(scraper: Arc<Scraper>) -> impl IntoResponse {
        tracing::debug!("Traversing route for /metrics endpoint for serving Prometheus metrics");
        match scraper.scrape().await {
            Ok(metrics) => {
                let metrics = match String::from_utf8(metrics) {
                    Ok(metrics_string) => metrics_string,
                    Err(_) => {
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Internal Server Error".into(),
                        )
                    }
                };
                (StatusCode::OK, metrics)
            }
            Err(err) => {
                tracing::error!(?err, "Failed to encode metrics");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to gather metrics".into(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use prometheus::{Counter, Registry};
    use tower::ServiceExt;

    use super::*;
    use crate::CoreMetrics;

    fn server(port: u16) -> Server {
        let mock_registry = Registry::new();
        let counter = Counter::new("expected_metric_content", "test123").unwrap();
        mock_registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();

        let metrics = Arc::new(CoreMetrics::new("test", port, mock_registry).unwrap());
        let scraper = Arc::new(Scraper::new(metrics, Duration::from_secs(1)));
        Server::new(port, scraper)
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let response = server(0)
            .router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let response = server(0)
            .router()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let server = Arc::new(server(18_081));
        // Run the server in the background
        let _server_task = tokio::spawn(async move { server.run().await });

        tokio::time::sleep(tokio::time::Duration::from_millis(1000)).await;

        let client = reqwest::Client::new();
        let response = client
            .get("http://127.0.0.1:18081/metrics")
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let body = response.text().await.expect("Failed to read response body");
        assert!(body.contains("expected_metric_content"));
    }
}
