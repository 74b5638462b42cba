// Custom error type and result alias for the service, built on thiserror.
use thiserror::Error;

use crate::engine::ForecastError;

pub mod response;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    // The #[from] attribute converts a redis::RedisError into AppError::Redis.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    /// A submitted value was out of range; rejected before it reaches the store.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registration against a username that already exists.
    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Chart error: {0}")]
    Chart(String),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
