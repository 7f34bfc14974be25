use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the whole API surface. Every handler returns
/// `Result<_, ApiError>`; the `IntoResponse` impl renders the JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid token.")]
    InvalidToken,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Payment for this request has already been made.")]
    DuplicatePayment,

    #[error("Internal server error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidToken => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicatePayment => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::InvalidToken => "invalid_token",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::DuplicatePayment => "duplicate_payment",
            ApiError::Database(_) => "database_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The driver error is logged but never forwarded to the client.
        if let ApiError::Database(ref err) = self {
            log::error!("database error: {}", err);
        }

        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            ApiError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized("no token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::DuplicatePayment.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn database_error_message_is_generic() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
