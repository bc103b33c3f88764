// Upstream module - Neople API access

pub mod client;
pub mod request;

pub use client::UpstreamClient;
pub use request::UpstreamRequest;
