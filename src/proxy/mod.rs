// proxy module - DNF API reverse proxy service

pub mod config;
pub mod error;
pub mod server;

pub mod common; // Response cache
pub mod handlers; // API endpoint handlers
pub mod middleware; // Axum middleware
pub mod upstream; // Upstream client

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use server::AxumServer;
