//! Response envelope types shared with the transport layer.
//!
//! The HTTP surface itself lives outside this crate; these types define the
//! `{success, data, meta}` / `{success, error}` shapes it wraps results in.

use serde::Serialize;
use serde_json::Value;

use crate::error::ServiceError;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T, meta: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            meta,
        }
    }
}

/// Machine-readable error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Failed response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = SuccessResponse::new(vec![1, 2, 3], Some(json!({"pagination": {}})));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"], json!([1, 2, 3]));
        assert!(value["meta"]["pagination"].is_object());
    }

    #[test]
    fn test_error_envelope_from_service_error() {
        let err = ServiceError::InvalidArgument("page must be >= 1".into());
        let envelope = ErrorResponse::from(&err);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["code"], json!("BAD_REQUEST"));
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("page must be >= 1"));
    }
}
