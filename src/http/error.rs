use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::application::{AppError, ErrorClass};

/// Errors a handler can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// The JSON body could not be read.
    InvalidBody(String),
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidBody(detail) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}\n", detail),
            )
                .into_response(),
            ApiError::App(err) => {
                let class = err.class();
                if class == ErrorClass::Internal {
                    error!(error = %err, "request failed");
                }
                (status_for(class), format!("{}\n", err.public_message())).into_response()
            }
        }
    }
}
