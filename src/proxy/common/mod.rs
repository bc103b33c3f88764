// Common module

pub mod cache;

pub use cache::{CacheKey, ResponseCache};
