//! The service layer implements authorization for buckets and files, and the operations on them.
//!
//! The authorization components are pure functions over an explicit [`AuthorizationContext`]:
//!
//!  - [`context`]: resolves raw identity facts into an [`AuthorizationContext`]
//!  - [`validator`]: restricts which roles a caller may grant
//!  - [`defaults`]: the grants applied when a caller supplies none
//!  - [`access`]: the effective permissions of a bucket or file, and access checks against them
//!  - [`policy`]: non-permission bucket policy
//!
//! [`FileService`] composes them with record and payload storage. It is designed as a library
//! crate to be used by the `server`.
//!
//! [`AuthorizationContext`]: filestore_types::AuthorizationContext
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod access;
pub mod backend;
mod catalog;
pub mod context;
pub mod defaults;
pub mod error;
pub mod policy;
mod service;
pub mod validator;

pub use error::{Result, ServiceError};
pub use service::*;
