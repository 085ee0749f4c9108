//! cache-keys-core: Shared infrastructure for the llm_cache_keys functions.
pub mod config;
pub mod db;
pub mod error;
pub mod invoke;
pub mod observability;
pub mod response;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use async_trait;
pub use serde_json;
pub use tokio;
pub use tracing;
