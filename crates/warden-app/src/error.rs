use salvo::http::StatusCode;
use salvo::writing::Json;
use serde::Serialize;
use thiserror::Error;
use warden_core::error::CoreError;
use warden_service::authz::NOT_PERMITTED;
use warden_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] warden_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    /// ## Summary
    /// Status code the error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(ServiceError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            Self::ServiceError(ServiceError::AuthorizationError(_)) => StatusCode::FORBIDDEN,
            Self::ServiceError(ServiceError::ValidationError(_))
            | Self::CoreError(CoreError::ParseError(_) | CoreError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::ServiceError(ServiceError::ActorNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// ## Summary
    /// Message safe to show the client. Denials and server faults never carry
    /// detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => "Authentication required".to_string(),
            StatusCode::FORBIDDEN => NOT_PERMITTED.to_string(),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

/// ## Summary
/// Writes `error` to `res` as a JSON error body with its status code.
pub fn render_error(res: &mut salvo::Response, error: &AppError) {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = ?error, "Request failed");
    } else {
        tracing::debug!(error = %error, status = %status, "Request rejected");
    }
    res.status_code(status);
    res.render(Json(ErrorResponse {
        error: error.public_message(),
    }));
}
