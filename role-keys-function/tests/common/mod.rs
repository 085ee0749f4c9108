//! Common test utilities for role-keys-function tests.

use cache_keys_core::store::CacheKeyStore;
use cache_keys_core::testing::MemoryConnector;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,role_keys_function=debug,cache_keys_core=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Store backed by `connector`. The connector is cloned so tests can keep
/// inspecting the shared in-memory state.
pub fn spawn_store(connector: &MemoryConnector) -> CacheKeyStore<MemoryConnector> {
    init_tracing();
    CacheKeyStore::new(connector.clone())
}
