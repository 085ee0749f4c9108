use crate::request::RoleRequest;
use cache_keys_core::db::Connector;
use cache_keys_core::error::AppError;
use cache_keys_core::response::LambdaResponse;
use cache_keys_core::store::CacheKeyStore;
use serde_json::Value;
use tracing::{instrument, warn};

pub fn added_message(key: &str) -> String {
    format!("Key '{}' added successfully", key)
}

/// Handle one `get_roles` / `add_role` event. Never fails: every error is
/// turned into a 400 or a generic 500 response.
#[instrument(skip_all, fields(service = "role-keys-function"))]
pub async fn function_handler<C: Connector>(
    store: &CacheKeyStore<C>,
    event: Value,
) -> LambdaResponse {
    match process_request(store, event).await {
        Ok(response) => response,
        Err(AppError::BadRequest(message)) => {
            warn!(reason = %message, "Rejected request");
            LambdaResponse::bad_request(message)
        }
        Err(e) => {
            // The session has already logged the failure itself.
            warn!(error = %e, "Responding with internal server error");
            e.into_response()
        }
    }
}

async fn process_request<C: Connector>(
    store: &CacheKeyStore<C>,
    event: Value,
) -> Result<LambdaResponse, AppError> {
    match RoleRequest::from_event(event)? {
        RoleRequest::GetRoles => Ok(LambdaResponse::keys(store.list_keys().await?)),
        RoleRequest::AddRole { key } => {
            store.add_key(&key).await?;
            Ok(LambdaResponse::message(added_message(&key)))
        }
    }
}
