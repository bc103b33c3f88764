// DNF Handler
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::proxy::error::ProxyError;
use crate::proxy::server::AppState;
use crate::proxy::upstream::request::UpstreamRequest;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub server: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterParams {
    pub server: Option<String>,
    pub character_id: Option<String>,
}

/// Required, non-empty query value
fn required(value: Option<String>, name: &'static str) -> Result<String, ProxyError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ProxyError::MissingParam(name)),
    }
}

/// Required value that becomes an upstream path segment. Dot segments would climb the upstream path.
fn required_segment(value: Option<String>, name: &'static str) -> Result<String, ProxyError> {
    let value = required(value, name)?;
    if value == "." || value == ".." {
        return Err(ProxyError::InvalidParam(name));
    }
    Ok(value)
}

/// GET /api/servers
pub async fn handle_list_servers(State(state): State<AppState>) -> Result<Json<Value>, ProxyError> {
    let payload = state
        .upstream
        .fetch_cached(&UpstreamRequest::servers())
        .await?;
    Ok(Json(payload))
}

/// GET /api/search?server=..&name=..
///
/// Returns only the `rows` array; no rows is a 404.
pub async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(params) = params?;
    let server = required_segment(params.server, "server")?;
    let name = required(params.name, "name")?;

    tracing::info!("Character search: server={}, name={}", server, name);

    let mut payload = state
        .upstream
        .fetch_cached(&UpstreamRequest::character_search(&server, &name))
        .await?;

    match payload.get_mut("rows").map(Value::take) {
        Some(rows @ Value::Array(_)) if rows.as_array().is_some_and(|r| !r.is_empty()) => {
            Ok(Json(rows))
        }
        _ => Err(ProxyError::NotFound),
    }
}

/// GET /api/character?server=..&characterId=..
///
/// Basic info and equipment are fetched concurrently; either failure fails the whole request.
pub async fn handle_character(
    State(state): State<AppState>,
    params: Result<Query<CharacterParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(params) = params?;
    let server = required_segment(params.server, "server")?;
    let character_id = required_segment(params.character_id, "characterId")?;

    let basic_request = UpstreamRequest::character_basic(&server, &character_id);
    let equipment_request = UpstreamRequest::character_equipment(&server, &character_id);

    let (basic, equipment) = futures::future::try_join(
        state.upstream.fetch_cached(&basic_request),
        state.upstream.fetch_cached(&equipment_request),
    )
    .await?;

    Ok(Json(json!({
        "basic": basic,
        "equipment": equipment,
    })))
}
