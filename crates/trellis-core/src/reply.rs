//! Endpoint return values.

use crate::{ApiError, ApiResponse};
use serde::Serialize;

/// What an endpoint method returns.
///
/// A `Reply::Data` is classified by the handler: JSON objects and arrays are
/// attached to the response as an [`Entity`](crate::Entity), any other JSON
/// shape is rejected. A `Reply::Response` is used as the response directly.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A structured value to attach as the response entity.
    Data(serde_json::Value),
    /// A finished response.
    Response(ApiResponse),
}

impl Reply {
    /// Serializes `value` into a data reply.
    ///
    /// Serialization failures become internal errors.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Self::Data)
            .map_err(|e| ApiError::internal_with_source("failed to serialize reply", e))
    }
}

impl From<ApiResponse> for Reply {
    fn from(response: ApiResponse) -> Self {
        Self::Response(response)
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

/// Result of invoking an endpoint method.
pub type HandlerResult = Result<Reply, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct User {
        id: i64,
        name: &'static str,
    }

    #[test]
    fn test_json_reply() {
        let reply = Reply::json(&User { id: 7, name: "ada" }).unwrap();
        match reply {
            Reply::Data(value) => assert_eq!(value, json!({"id": 7, "name": "ada"})),
            Reply::Response(_) => panic!("expected data"),
        }
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(Reply::from(json!([])), Reply::Data(_)));
        assert!(matches!(Reply::from(ApiResponse::new()), Reply::Response(_)));
    }
}
