//! Get/Add Role function: lists the keys in `llm_cache_keys` or adds one.

pub mod handler;
pub mod request;

pub use handler::function_handler;
pub use request::RoleRequest;
