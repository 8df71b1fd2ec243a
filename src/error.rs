use async_graphql::ErrorExtensions;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("GraphQL error: {0}")]
    GraphqlError(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl TrackerError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            TrackerError::DatabaseError(_) => "DATABASE_ERROR",
            TrackerError::InvalidInput(_) | TrackerError::InvalidStatus(_) => "INVALID_INPUT",
            TrackerError::HttpError(_) => "HTTP_ERROR",
            TrackerError::GraphqlError(_) => "GRAPHQL_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }
}

impl ErrorExtensions for TrackerError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", self.to_error_code()))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
