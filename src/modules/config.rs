use std::fs;

use axum::http::HeaderValue;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::proxy::ProxyConfig;

pub const API_KEY_ENV: &str = "NEOPLE_API_KEY";
pub const CONFIG_PATH_ENV: &str = "DNF_PROXY_CONFIG";

/// Load proxy config: optional JSON file, then environment overrides, then validation.
///
/// Fails when `NEOPLE_API_KEY` is missing so the process never serves traffic without it.
pub fn load_proxy_config() -> AppResult<ProxyConfig> {
    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_config_file(&path)?,
        _ => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    tracing::info!(
        "Config loaded: upstream={}, origins={:?}, port={}",
        config.upstream_base,
        config.allowed_origins,
        config.port
    );
    Ok(config)
}

fn load_config_file(path: &str) -> AppResult<ProxyConfig> {
    let content = fs::read_to_string(path)?;

    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {}: {}", path, e)))
}

/// Apply environment variables on top of `config`. `lookup` abstracts `std::env::var`.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(API_KEY_ENV) {
        config.api_key = key.trim().to_string();
    }

    if let Some(origins) = lookup("DNF_PROXY_ALLOWED_ORIGINS") {
        config.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(base) = lookup("DNF_PROXY_UPSTREAM_BASE") {
        config.upstream_base = base.trim().to_string();
    }

    if let Some(port) = lookup("PORT") {
        config.port = parse_env("PORT", &port)?;
    }

    if let Some(flag) = lookup("DNF_PROXY_ALLOW_LAN") {
        config.allow_lan_access = parse_env("DNF_PROXY_ALLOW_LAN", &flag)?;
    }

    if let Some(timeout) = lookup("DNF_PROXY_REQUEST_TIMEOUT") {
        config.request_timeout = parse_env("DNF_PROXY_REQUEST_TIMEOUT", &timeout)?;
    }

    if let Some(max) = lookup("DNF_PROXY_CACHE_MAX_ENTRIES") {
        config.cache_max_entries = parse_env("DNF_PROXY_CACHE_MAX_ENTRIES", &max)?;
    }

    if let Some(proxy_url) = lookup("DNF_PROXY_UPSTREAM_PROXY") {
        let proxy_url = proxy_url.trim().to_string();
        config.upstream_proxy.enabled = !proxy_url.is_empty();
        config.upstream_proxy.url = proxy_url;
    }

    Ok(())
}

fn parse_env<T>(name: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e)))
}

/// Startup checks. Anything rejected here would otherwise fail on every request.
pub fn validate(config: &ProxyConfig) -> AppResult<()> {
    if config.api_key.is_empty() {
        return Err(AppError::Config(format!(
            "Environment variable {} is not set",
            API_KEY_ENV
        )));
    }

    let base = Url::parse(&config.upstream_base).map_err(|e| {
        AppError::Config(format!(
            "Invalid upstream base {}: {}",
            config.upstream_base, e
        ))
    })?;
    if base.cannot_be_a_base() {
        return Err(AppError::Config(format!(
            "Upstream base cannot carry a path: {}",
            config.upstream_base
        )));
    }

    if config.allowed_origins.is_empty() {
        return Err(AppError::Config("No allowed origin configured".to_string()));
    }
    for origin in &config.allowed_origins {
        if origin == "*" {
            return Err(AppError::Config(
                "Wildcard origin is not allowed; list the frontend origin explicitly".to_string(),
            ));
        }
        HeaderValue::from_str(origin)
            .map_err(|_| AppError::Config(format!("Invalid origin: {}", origin)))?;
    }

    if config.request_timeout == 0 {
        return Err(AppError::Config(
            "Request timeout must be at least 1 second".to_string(),
        ));
    }

    if config.cache_max_entries == 0 {
        return Err(AppError::Config(
            "Cache capacity must be at least 1".to_string(),
        ));
    }

    Ok(())
}
