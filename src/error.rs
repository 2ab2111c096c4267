use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ErrorMessage {
    #[error("You are not logged in, please provide a token")]
    TokenNotProvided,
    #[error("Authentication token is invalid or has expired")]
    InvalidToken,
    #[error("User belonging to this token no longer exists")]
    UserNoLongerExist,
    #[error("User is not authenticated")]
    UserNotAuthenticated,
    #[error("You are not allowed to perform this action")]
    PermissionDenied,
    #[error("Access denied to this department ticket")]
    DepartmentAccessDenied,
    #[error("Ticket not found")]
    TicketNotFound,
    #[error("Department not found")]
    DepartmentNotFound,
    #[error("Duplicate ticket number")]
    DuplicateTicketNumber,
    #[error("Rating must be between 1 and 5")]
    InvalidRating,
    #[error("You can only give feedback on your own tickets")]
    FeedbackNotOwner,
    #[error("You can only give feedback on resolved tickets")]
    FeedbackNotResolved,
    #[error("Feedback already submitted for this ticket")]
    FeedbackAlreadySubmitted,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::NOT_FOUND)
    }

    /// Retryable duplicate at persistence time, e.g. a ticket-number
    /// collision caught by the unique index.
    pub fn conflict(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::CONFLICT)
    }

    pub fn into_http_response(self) -> axum::response::Response {
        let status = if self.status.is_server_error() {
            "error"
        } else {
            "fail"
        };

        let body = Json(ErrorResponse {
            status: status.to_string(),
            message: self.message.clone(),
        });

        (self.status, body).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        self.into_http_response()
    }
}

/// Classify a persistence error once, at the boundary. Unique violations on
/// the ticket number surface as a retryable conflict; everything else is a
/// 500 whose raw detail is only exposed outside production.
pub fn map_sqlx_error(err: sqlx::Error, environment: &str) -> HttpError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("ticket_number") {
                return HttpError::conflict(ErrorMessage::DuplicateTicketNumber.to_string());
            }
            return HttpError::conflict(db_err.message().to_string());
        }
    }

    tracing::error!("database error: {}", err);

    if environment == "production" {
        HttpError::server_error("Internal Server Error")
    } else {
        HttpError::server_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_expected_status_codes() {
        assert_eq!(HttpError::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(HttpError::unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(HttpError::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(HttpError::not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(HttpError::conflict("x").status, StatusCode::CONFLICT);
        assert_eq!(
            HttpError::server_error("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn forbidden_is_distinct_from_not_found() {
        assert_ne!(
            HttpError::forbidden(ErrorMessage::DepartmentAccessDenied.to_string()).status,
            HttpError::not_found(ErrorMessage::TicketNotFound.to_string()).status
        );
    }

    #[test]
    fn row_not_found_is_not_a_conflict() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound, "development");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
