use serde::{Deserialize, Serialize};

pub const DEFAULT_UPSTREAM_BASE: &str = "https://api.dfoneople.com/df";

/// GitHub Pages origin of the frontend (origin only, no path)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://category-13.github.io";

/// 反代服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Neople API key, injected into every upstream request
    #[serde(default)]
    pub api_key: String,

    /// Origins granted cross-origin access
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Upstream base address, e.g. `https://api.dfoneople.com/df`
    #[serde(default = "default_upstream_base")]
    pub upstream_base: String,

    /// 是否允许外部访问
    /// - true: 监听 0.0.0.0（默认，容器/PaaS 按 PORT 部署时需要）
    /// - false: 仅本机访问 127.0.0.1
    #[serde(default = "default_allow_lan_access")]
    pub allow_lan_access: bool,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum number of cached upstream responses
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// 上游代理配置
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// 上游代理配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// 是否启用
    pub enabled: bool,
    /// 代理地址 (http://, https://, socks5://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            allowed_origins: default_allowed_origins(),
            upstream_base: default_upstream_base(),
            allow_lan_access: default_allow_lan_access(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            cache_max_entries: default_cache_max_entries(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
}

fn default_upstream_base() -> String {
    DEFAULT_UPSTREAM_BASE.to_string()
}

fn default_allow_lan_access() -> bool {
    true
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    10
}

fn default_cache_max_entries() -> usize {
    10_000
}

impl ProxyConfig {
    /// 获取实际的监听地址
    /// - allow_lan_access = true: 返回 "0.0.0.0"（默认）
    /// - allow_lan_access = false: 返回 "127.0.0.1"（仅本机）
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}
