//! Success envelope
//!
//! Every successful response body is
//! `{statusCode, data, message, success}`; failures use the same shape
//! via [`AppError`](crate::error::AppError).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T> {
    status_code: u16,
    data: &'a T,
    message: &'a str,
    success: bool,
}

/// Enveloped response with an explicit HTTP status
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
    message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status,
            data,
            message: message.into(),
        }
    }

    /// 200 OK
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 Created
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status_code: self.status.as_u16(),
            data: &self.data,
            message: &self.message,
            success: self.status.as_u16() < 400,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn envelope_shape() {
        let response =
            ApiResponse::created(serde_json::json!({"id": "abc"}), "Created").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["statusCode"], 201);
        assert_eq!(json["data"]["id"], "abc");
        assert_eq!(json["message"], "Created");
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn unit_data_is_null() {
        let response = ApiResponse::ok((), "Done").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["data"].is_null());
    }
}
