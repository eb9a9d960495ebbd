use thiserror::Error;
use warden_core::types::UserId;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Actor not found: {0}")]
    ActorNotFound(UserId),

    #[error("Permission cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Audit write failed: {0}")]
    AuditWriteFailed(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    DatabaseError(#[from] warden_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] warden_core::error::CoreError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
