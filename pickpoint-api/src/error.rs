use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use pickpoint_core::ValidationError;
use pickpoint_orders::OrderError;

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Order(OrderError),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        Self::Order(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Order(err) => match err {
                OrderError::WrongExpiration
                | OrderError::InvalidPackage
                | OrderError::WeightExceeded
                | OrderError::Pagination => (StatusCode::BAD_REQUEST, err.to_string()),
                OrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                OrderError::Exists(_) => (StatusCode::CONFLICT, err.to_string()),
                OrderError::CannotReturn
                | OrderError::CannotReceive
                | OrderError::CannotRefund => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
                OrderError::Store(err) => {
                    tracing::error!("Internal Server Error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
