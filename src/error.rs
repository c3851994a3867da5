use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::coupons::CouponError;
use crate::services::registry_export::RenderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error("Export rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Coupon(e) => {
                let status = match e {
                    CouponError::NotFoundOrInactive => StatusCode::NOT_FOUND,
                    CouponError::Expired
                    | CouponError::BelowMinimum { .. }
                    | CouponError::Validation(_) => StatusCode::BAD_REQUEST,
                    CouponError::Conflict => StatusCode::CONFLICT,
                    CouponError::DatabaseError(_) => {
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Database error".to_string(),
                        )
                    }
                };
                (status, e.to_string())
            }
            AppError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate export file".to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_error_statuses() {
        let cases = [
            (CouponError::NotFoundOrInactive, StatusCode::NOT_FOUND),
            (CouponError::Expired, StatusCode::BAD_REQUEST),
            (
                CouponError::BelowMinimum { min_amount: 500.0 },
                StatusCode::BAD_REQUEST,
            ),
            (CouponError::Conflict, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            let (status, _) = AppError::from(err).status_and_message();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_below_minimum_message_passes_through() {
        let (_, message) =
            AppError::from(CouponError::BelowMinimum { min_amount: 500.0 }).status_and_message();
        assert!(message.contains("500"));
    }

    #[tokio::test]
    async fn test_json_rejection_becomes_validation() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"code":"SAVE10"}"#))
            .unwrap();
        let rejection = Json::<std::collections::HashMap<String, f64>>::from_request(request, &())
            .await
            .err()
            .unwrap();

        let err = AppError::from(rejection);
        assert!(matches!(err, AppError::Validation(_)));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!message.is_empty());
    }

    #[test]
    fn test_database_detail_is_hidden() {
        let (status, message) = AppError::from(sqlx::Error::RowNotFound).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Database error");
    }
}
