//! Response envelope returned by every function invocation.

use http::StatusCode;
use serde::{Deserialize, Serialize};

pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// `{"statusCode": .., "body": ..}` as the Lambda caller expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Keys(Vec<String>),
    Message(String),
}

impl LambdaResponse {
    fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self {
            status_code: status.as_u16(),
            body,
        }
    }

    pub fn keys(keys: Vec<String>) -> Self {
        Self::new(StatusCode::OK, ResponseBody::Keys(keys))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, ResponseBody::Message(message.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ResponseBody::Message(message.into()))
    }

    pub fn internal_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ResponseBody::Message(INTERNAL_ERROR_BODY.to_string()),
        )
    }

    pub fn is_success(&self) -> bool {
        StatusCode::from_u16(self.status_code)
            .map(|s| s.is_success())
            .unwrap_or(false)
    }
}
