use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use urlencoding;

use crate::errors::AppError;

// Converts AppError into a well-formed HTTP response. No error kind is fatal
// to the process; each maps to a plain message or a redirect.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Authentication errors redirect to login
            AppError::Auth(msg) => {
                Redirect::to(&format!("/?error={}", urlencoding::encode(&msg))).into_response()
            }

            // Database errors are internal server errors
            AppError::Redis(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            )
                .into_response(),

            AppError::File(e) => {
                (StatusCode::BAD_REQUEST, format!("File error: {}", e)).into_response()
            }

            // Rejected submissions are bad requests
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, format!("Validation error: {}", msg)).into_response()
            }

            // Duplicate registrations return to the register form
            AppError::DuplicateUser(_) => {
                Redirect::to("/?error=Username%20already%20taken&form=register").into_response()
            }

            AppError::Forecast(e) => {
                (StatusCode::BAD_REQUEST, format!("Forecast error: {}", e)).into_response()
            }

            AppError::Chart(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Chart error: {}", msg),
            )
                .into_response(),
        }
    }
}
