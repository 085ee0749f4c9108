//! List Cache Keys function: returns every key stored in `llm_cache_keys`.

pub mod handler;

pub use handler::function_handler;
