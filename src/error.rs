use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

/// Stable classification of every failure the engine reports.
///
/// Callers branch on the kind rather than on message text; an HTTP layer maps
/// each kind to one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    UnsupportedPurpose,
    AuthenticationFailed,
    NotVerified,
    SessionNotFound,
    Forbidden,
    AlreadyOutstanding,
    DuplicateAddress,
    OldPasswordMismatch,
    UserNotFound,
    Internal,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unsupported verification purpose: {0}")]
    UnsupportedPurpose(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Account is not verified")]
    NotVerified,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Verification code already sent, wait until it expires")]
    AlreadyOutstanding,

    #[error("Address already registered: {0}")]
    DuplicateAddress(String),

    #[error("Old password does not match")]
    OldPasswordMismatch,

    #[error("User not found")]
    UserNotFound,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::ValidationError(_) => ErrorKind::Validation,
            AuthError::UnsupportedPurpose(_) => ErrorKind::UnsupportedPurpose,
            AuthError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            AuthError::NotVerified => ErrorKind::NotVerified,
            AuthError::SessionNotFound => ErrorKind::SessionNotFound,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::AlreadyOutstanding => ErrorKind::AlreadyOutstanding,
            AuthError::DuplicateAddress(_) => ErrorKind::DuplicateAddress,
            AuthError::OldPasswordMismatch => ErrorKind::OldPasswordMismatch,
            AuthError::UserNotFound => ErrorKind::UserNotFound,
            AuthError::ConfigError(_) | AuthError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to a client. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<RepoError> for AuthError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AuthError::UserNotFound,
            RepoError::UniqueViolation(constraint) => AuthError::DuplicateAddress(constraint),
            RepoError::Internal(msg) => AuthError::InternalError(msg),
        }
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.client_message()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::UnsupportedPurpose => StatusCode::BAD_REQUEST,
            ErrorKind::OldPasswordMismatch => StatusCode::BAD_REQUEST,
            ErrorKind::AuthenticationFailed | ErrorKind::SessionNotFound => StatusCode::UNAUTHORIZED,
            ErrorKind::NotVerified | ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::UserNotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateAddress => StatusCode::CONFLICT,
            ErrorKind::AlreadyOutstanding => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures of the token codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issuer mismatch")]
    IssuerMismatch,

    #[error("Token purpose mismatch")]
    PurposeMismatch,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtKind;

        match err.kind() {
            JwtKind::InvalidSignature | JwtKind::InvalidAlgorithm => TokenError::InvalidSignature,
            JwtKind::ExpiredSignature => TokenError::Expired,
            JwtKind::InvalidIssuer => TokenError::IssuerMismatch,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Failures of the session and OTP key-value stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found or expired")]
    NotFound,

    #[error("Record already exists")]
    AlreadyExists,

    #[error("Store error: {0}")]
    Internal(String),
}

/// Failures reported by the user repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Repository error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23505") => {
                RepoError::UniqueViolation(db_err.constraint().unwrap_or("unique").to_string())
            }
            _ => RepoError::Internal(err.to_string()),
        }
    }
}

/// Failures of the notification transports.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway rejected message: {0}")]
    Gateway(String),
}
