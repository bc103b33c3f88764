use reqwest::{Client, Proxy};

use crate::error::AppResult;
use crate::proxy::config::UpstreamProxyConfig;

const USER_AGENT: &str = concat!("dnf-proxy/", env!("CARGO_PKG_VERSION"));

/// Create an HTTP client with specified timeout and optional upstream proxy
pub fn create_client_with_proxy(
    timeout: std::time::Duration,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> AppResult<Client> {
    let mut builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);

    if let Some(config) = proxy_config {
        if config.enabled && !config.url.is_empty() {
            match Proxy::all(&config.url) {
                Ok(proxy) => {
                    builder = builder.proxy(proxy);
                    tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
                }
                Err(e) => {
                    tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                }
            }
        }
    }

    Ok(builder.build()?)
}
