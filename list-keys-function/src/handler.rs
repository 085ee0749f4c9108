use cache_keys_core::db::Connector;
use cache_keys_core::error::AppError;
use cache_keys_core::response::LambdaResponse;
use cache_keys_core::store::CacheKeyStore;
use serde_json::Value;
use tracing::{instrument, warn};

/// Respond with every stored key. The event carries nothing of interest.
#[instrument(skip_all, fields(service = "list-keys-function"))]
pub async fn function_handler<C: Connector>(
    store: &CacheKeyStore<C>,
    _event: Value,
) -> LambdaResponse {
    match store.list_keys().await {
        Ok(keys) => LambdaResponse::keys(keys),
        Err(e) => {
            // The session has already logged the failure itself.
            warn!(error = %e, "Responding with internal server error");
            AppError::from(e).into_response()
        }
    }
}
