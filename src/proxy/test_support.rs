// Mock Neople upstream for handler and client tests
use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use dashmap::DashMap;
use reqwest::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::proxy::common::cache::ResponseCache;
use crate::proxy::upstream::client::UpstreamClient;

pub const TEST_API_KEY: &str = "test-key";

#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<DashMap<String, usize>>,
    last_query: Arc<Mutex<Option<String>>>,
    rate_limited: Arc<AtomicBool>,
}

pub struct MockUpstream {
    pub base: String,
    recorder: Recorder,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let recorder = Recorder::default();

        let app = Router::new()
            .route("/df/servers", get(servers))
            .route("/df/servers/:server/characters", get(search))
            .route("/df/servers/:server/characters/:id", get(basic))
            .route("/df/servers/:server/characters/:id/equip/equipment", get(equipment))
            .route("/df/plain", get(|| async { "not json" }))
            .route(
                "/df/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    Json(json!({}))
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                recorder.clone(),
                record,
            ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}/df", addr),
            recorder,
        }
    }

    pub fn hits(&self, path: &str) -> usize {
        self.recorder.hits.get(path).map(|n| *n).unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.recorder.hits.iter().map(|entry| *entry.value()).sum()
    }

    /// Answer every request with 429 while set
    pub fn set_rate_limited(&self, on: bool) {
        self.recorder.rate_limited.store(on, Ordering::SeqCst);
    }

    pub fn last_query(&self) -> Option<String> {
        self.recorder.last_query.lock().unwrap().clone()
    }
}

/// Client pointed at `mock`, 1s timeout, system proxies ignored
pub fn test_upstream_client(mock: &MockUpstream) -> UpstreamClient {
    let http_client = Client::builder()
        .timeout(Duration::from_secs(1))
        .no_proxy()
        .build()
        .unwrap();

    UpstreamClient::from_parts(
        http_client,
        Url::parse(&mock.base).unwrap(),
        TEST_API_KEY.to_string(),
        ResponseCache::new(64),
    )
}

async fn record(State(recorder): State<Recorder>, request: Request, next: Next) -> Response {
    *recorder
        .hits
        .entry(request.uri().path().to_string())
        .or_insert(0) += 1;
    *recorder.last_query.lock().unwrap() = request.uri().query().map(str::to_string);

    let authorized = request
        .uri()
        .query()
        .map(|q| q.split('&').any(|pair| pair == format!("apikey={}", TEST_API_KEY)))
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"status": 401, "code": "API001"}})),
        )
            .into_response();
    }

    if recorder.rate_limited.load(Ordering::SeqCst) {
        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
    }

    next.run(request).await
}

async fn servers() -> Json<serde_json::Value> {
    Json(json!({"rows": [{"serverId": "cain", "serverName": "카인"}]}))
}

async fn search(
    Path(server): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let name = query.get("characterName").cloned().unwrap_or_default();
    match name.as_str() {
        "limited" => (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response(),
        "ghost" => Json(json!({"rows": []})).into_response(),
        "norows" => Json(json!({})).into_response(),
        _ => Json(json!({
            "rows": [{
                "serverId": server,
                "characterId": format!("id-{}", name),
                "characterName": name,
                "level": 110
            }]
        }))
        .into_response(),
    }
}

async fn basic(Path((server, id)): Path<(String, String)>) -> Response {
    if id == "limited" {
        return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
    }
    Json(json!({"serverId": server, "characterId": id, "jobName": "귀검사"})).into_response()
}

async fn equipment(Path((server, id)): Path<(String, String)>) -> Response {
    if id == "broken-equip" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "equipment backend down").into_response();
    }
    Json(json!({
        "serverId": server,
        "characterId": id,
        "equipment": [{"slotId": "WEAPON", "itemName": "검"}]
    }))
    .into_response()
}
