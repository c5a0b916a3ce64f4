//! Errors of the file service.
//!
//! Every failure of a [`FileService`](crate::FileService) operation surfaces as a
//! [`ServiceError`], which wraps the authorization, policy and backend errors of the submodules.

use filestore_types::id::InvalidIdError;
use thiserror::Error;

use crate::access::AccessDeniedError;
use crate::backend::BackendError;
use crate::policy::PolicyError;
use crate::validator::{ActionNotAllowedError, ForbiddenRoleError};

/// Errors that can occur in the file service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A requested grant names a role the caller may not grant.
    #[error(transparent)]
    ForbiddenRole(#[from] ForbiddenRoleError),

    /// A requested grant uses an action that does not apply to the resource.
    #[error(transparent)]
    ActionNotAllowed(#[from] ActionNotAllowedError),

    /// The caller may not perform the action.
    #[error(transparent)]
    AccessDenied(#[from] AccessDeniedError),

    /// The operation requires administrative credentials.
    #[error("this operation requires privileged credentials")]
    PrivilegedRequired,

    /// A bucket policy rejected the operation.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A bucket or file ID is malformed.
    #[error("invalid id: {0}")]
    InvalidId(#[from] InvalidIdError),

    /// A request parameter is invalid.
    #[error("{0}")]
    InvalidInput(String),

    /// The bucket does not exist.
    #[error("bucket `{0}` could not be found")]
    BucketNotFound(String),

    /// The file does not exist.
    #[error("file `{0}` could not be found")]
    FileNotFound(String),

    /// A bucket with the same ID already exists.
    #[error("a bucket with the id `{0}` already exists")]
    BucketExists(String),

    /// A file with the same ID already exists in the bucket.
    #[error("a file with the id `{0}` already exists")]
    FileExists(String),

    /// An error from the storage backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for service operations.
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
