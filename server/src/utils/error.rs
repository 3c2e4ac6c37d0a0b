use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::{StoreError, UniqueConstraint};
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("No ticket available: {0}")]
    NoTicketAvailable(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueConstraint::EntryPerUser) => {
                AppError::DuplicateEntry("You have already entered this raffle".to_string())
            }
            StoreError::Duplicate(UniqueConstraint::EntryTicket) => AppError::DuplicateEntry(
                "This ticket has already been redeemed".to_string(),
            ),
            StoreError::EntriesClosed(raffle_id) => AppError::ValidationError(format!(
                "Entries for raffle {raffle_id} are closed"
            )),
            StoreError::UnknownEntry(raffle_id) => AppError::InternalServerError(format!(
                "Winner drawn for raffle {raffle_id} is not one of its entries"
            )),
            StoreError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NoTicketAvailable(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEntry(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NoTicketAvailable(_) => "NO_TICKET_AVAILABLE",
            AppError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::NoTicketAvailable(msg)
            | AppError::DuplicateEntry(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::NoTicketAvailable(msg)
            | AppError::DuplicateEntry(msg) => msg.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_constraints_map_to_conflict() {
        let err = AppError::from(StoreError::Duplicate(UniqueConstraint::EntryPerUser));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "DUPLICATE_ENTRY");

        let err = AppError::from(StoreError::Duplicate(UniqueConstraint::EntryTicket));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_closed_raffle_is_a_validation_error() {
        let err = AppError::from(StoreError::EntriesClosed(3));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Validation error: Entries for raffle 3 are closed");
    }

    #[test]
    fn test_database_errors_are_not_exposed() {
        let response = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_ticket_is_not_found() {
        let err = AppError::NoTicketAvailable("none left".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NO_TICKET_AVAILABLE");
    }
}
