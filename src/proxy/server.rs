use crate::error::{AppError, AppResult};
use crate::proxy::config::ProxyConfig;
use crate::proxy::upstream::client::UpstreamClient;
use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
}

/// Routes plus middleware. Split out of `start` so tests can drive it without a socket.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    use crate::proxy::handlers;

    Router::new()
        .route("/api/servers", get(handlers::dnf::handle_list_servers))
        .route("/api/search", get(handlers::dnf::handle_search))
        .route("/api/character", get(handlers::dnf::handle_character))
        .route("/healthz", get(health_check_handler))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::logging_middleware,
        ))
        .layer(crate::proxy::middleware::cors_layer(allowed_origins))
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: std::net::SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(config: &ProxyConfig) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let state = AppState {
            upstream: Arc::new(UpstreamClient::new(config)?),
        };
        let app = build_router(state, &config.allowed_origins);

        // Bind address
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            AppError::Config(format!("Failed to bind address {}: {}", addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("DNF proxy started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("DNF proxy stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                shutdown_tx: Some(shutdown_tx),
                local_addr,
            },
            handle,
        ))
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "cache_entries": state.upstream.cache().len(),
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::MockUpstream;

    fn config_for(mock: &MockUpstream) -> ProxyConfig {
        ProxyConfig {
            api_key: crate::proxy::test_support::TEST_API_KEY.to_string(),
            upstream_base: mock.base.clone(),
            allow_lan_access: false,
            port: 0,
            ..ProxyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_server_serves_and_stops() {
        let mock = MockUpstream::start().await;
        let (server, handle) = AxumServer::start(&config_for(&mock)).await.unwrap();
        let base = format!("http://{}", server.local_addr());

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let health: serde_json::Value = client
            .get(format!("{}/healthz", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["cache_entries"], 0);

        let response = client
            .get(format!("{}/healthz", base))
            .header("Origin", "https://category-13.github.io")
            .send()
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://category-13.github.io"
        );
        assert_eq!(mock.total_hits(), 0);

        server.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        use axum::{body::Body, http::Request, http::StatusCode};
        use tower::ServiceExt;

        let mock = MockUpstream::start().await;
        let state = AppState {
            upstream: Arc::new(crate::proxy::test_support::test_upstream_client(&mock)),
        };
        let response = build_router(state, &[])
            .oneshot(Request::builder().uri("/api/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(mock.total_hits(), 0);
    }
}
