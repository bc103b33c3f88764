// Request logging middleware
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Log method, path, status and latency. Query strings are left out of the log line.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    if status.is_server_error() {
        tracing::warn!("{} {} -> {} ({} ms)", method, path, status, elapsed_ms);
    } else {
        tracing::info!("{} {} -> {} ({} ms)", method, path, status, elapsed_ms);
    }

    response
}
