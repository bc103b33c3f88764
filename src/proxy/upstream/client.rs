// Upstream client implementation
// Every Neople call goes through fetch_cached

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::proxy::common::cache::{CacheKey, ResponseCache};
use crate::proxy::config::ProxyConfig;
use crate::proxy::error::ProxyError;
use crate::proxy::upstream::request::UpstreamRequest;

const API_KEY_PARAM: &str = "apikey";

pub struct UpstreamClient {
    http_client: Client,
    base_url: Url,
    api_key: String,
    cache: ResponseCache,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let http_client = crate::utils::http::create_client_with_proxy(
            Duration::from_secs(config.request_timeout),
            Some(&config.upstream_proxy),
        )?;
        let base_url = Url::parse(&config.upstream_base)
            .map_err(|e| AppError::Config(format!("Invalid upstream base: {}", e)))?;

        Ok(Self::from_parts(
            http_client,
            base_url,
            config.api_key.clone(),
            ResponseCache::new(config.cache_max_entries),
        ))
    }

    pub fn from_parts(
        http_client: Client,
        base_url: Url,
        api_key: String,
        cache: ResponseCache,
    ) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
            cache,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Append percent-encoded segments to the base path
    fn build_url(base: &Url, segments: &[String]) -> Result<Url, ProxyError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ProxyError::Network(format!("Upstream base cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Cached GET against the upstream.
    ///
    /// A live cache entry is returned without any network call. Otherwise the
    /// request is sent with the API key appended last, and only a successful
    /// JSON response is stored for `request.ttl`.
    pub async fn fetch_cached(&self, request: &UpstreamRequest) -> Result<Value, ProxyError> {
        let url = Self::build_url(&self.base_url, &request.segments)?;
        let key = CacheKey::new(
            url.path(),
            request.params.iter().map(|(k, v)| (*k, v.as_str())),
        );

        if let Some(payload) = self.cache.get(&key) {
            tracing::debug!("Cache hit: {}", url.path());
            return Ok(payload);
        }

        tracing::debug!("Cache miss, calling upstream: GET {}", url.path());

        let mut query: Vec<(&str, &str)> = request
            .params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        query.push((API_KEY_PARAM, self.api_key.as_str()));

        let response = self
            .http_client
            .get(url.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Upstream request failed: GET {}: {}", url.path(), e);
                ProxyError::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Upstream rate limited: GET {}", url.path());
            return Err(ProxyError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                tracing::warn!(
                    "Upstream error {} with unreadable body: GET {}: {}",
                    status,
                    url.path(),
                    e
                );
                ProxyError::from(e)
            })?;
            tracing::warn!("Upstream error {}: GET {}", status, url.path());
            return Err(ProxyError::Upstream { status, body });
        }

        let bytes = response.bytes().await?;
        let payload: Value =
            serde_json::from_slice(&bytes).map_err(|e| ProxyError::Decode(e.to_string()))?;

        self.cache.insert(key, payload.clone(), request.ttl);
        Ok(payload)
    }
}
