//! List Cache Keys function entry point.

use cache_keys_core::config::AppConfig;
use cache_keys_core::db::PgConnector;
use cache_keys_core::invoke::{local_event, print_response};
use cache_keys_core::observability::init_tracing;
use cache_keys_core::store::CacheKeyStore;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use list_keys_function::function_handler;
use serde_json::Value;
use tracing::Instrument;

const SERVICE_NAME: &str = "list-keys-function";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load configuration
    let config = AppConfig::load(SERVICE_NAME).inspect_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
    })?;

    init_tracing(&config.service_name, &config.log_level);

    // Log configuration (password stays redacted)
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        db_host = %config.db.host,
        db_port = config.db.port,
        db_name = %config.db.dbname,
        "Starting list-keys-function"
    );

    let store = CacheKeyStore::new(PgConnector::new(config.db));

    if let Some(event) = local_event(std::env::args().skip(1))? {
        let response = function_handler(&store, event).await;
        print_response(&response)?;
        return Ok(());
    }

    let store = &store;
    run(service_fn(move |event: LambdaEvent<Value>| {
        let span = tracing::info_span!("invocation", request_id = %event.context.request_id);
        async move { Ok::<_, Error>(function_handler(store, event.payload).await) }.instrument(span)
    }))
    .await
}
