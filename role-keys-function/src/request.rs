//! Inbound event decoding.

use cache_keys_core::error::AppError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const MISSING_KEY: &str = "Missing key";
pub const INVALID_REQUEST: &str = "Invalid request";

const ADD_ROLE: &str = "add_role";

/// Raw event fields. Kept as loose JSON so that a stray or wrong-typed field
/// never stops a `get_roles` request.
#[derive(Debug, Default, Deserialize)]
struct RoleEvent {
    #[serde(default)]
    request_type: Option<Value>,
    #[serde(default)]
    key: Option<Value>,
}

impl RoleEvent {
    fn is_add_role(&self) -> bool {
        matches!(&self.request_type, Some(Value::String(kind)) if kind == ADD_ROLE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequest {
    GetRoles,
    AddRole { key: String },
}

impl RoleRequest {
    /// Decode and validate an event. Anything but `request_type: "add_role"`
    /// is a `GetRoles`. Fails with `BadRequest` when the event is not an
    /// object, or when an `add_role` carries no usable key.
    pub fn from_event(event: Value) -> Result<Self, AppError> {
        let event: RoleEvent = match event {
            Value::Null => RoleEvent::default(),
            Value::Object(fields) => {
                serde_json::from_value(Value::Object(fields)).map_err(|e| {
                    debug!(error = %e, "Malformed event");
                    AppError::BadRequest(INVALID_REQUEST.to_string())
                })?
            }
            _ => return Err(AppError::BadRequest(INVALID_REQUEST.to_string())),
        };

        if !event.is_add_role() {
            return Ok(RoleRequest::GetRoles);
        }

        match event.key {
            Some(Value::String(key)) if !key.is_empty() => Ok(RoleRequest::AddRole { key }),
            _ => Err(AppError::BadRequest(MISSING_KEY.to_string())),
        }
    }
}
