use filestore_service::context::UnauthenticatedError;
use thiserror::Error;

/// Error type for different authentication failure scenarios.
#[derive(Error, Debug, PartialEq)]
pub enum AuthError {
    /// Indicates that something about the request prevented authentication from happening
    /// properly, such as a malformed header.
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// Indicates that the presented API key is not configured.
    #[error("invalid API key")]
    InvalidApiKey,

    /// Indicates that the session token is invalid (e.g. expired or malformed).
    #[error("failed to decode session token: {0}")]
    ValidationFailure(#[from] jsonwebtoken::errors::Error),

    /// Indicates that the session token names a key that is not configured.
    #[error("session token signed with unknown key `{0}`")]
    UnknownKey(String),

    /// Indicates that an otherwise-valid token was unable to be verified with configured keys.
    #[error("failed to verify session token")]
    VerificationFailure,

    /// Indicates that no caller identity could be established from the credentials.
    #[error(transparent)]
    Unauthenticated(#[from] UnauthenticatedError),
}
