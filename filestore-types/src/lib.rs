//! Shared types for the filestore service.
//!
//! This crate holds the vocabulary that every other filestore crate speaks:
//!
//!  - [`role`]: the closed set of [`Role`]s a permission can be granted to
//!  - [`permission`]: the `action(role)` grammar for [`Permission`]s
//!  - [`auth`]: the resolved [`AuthorizationContext`] of a caller
//!  - [`id`]: the shared format of bucket, file and identity IDs
//!  - [`model`]: the [`Bucket`] and [`File`] records as they appear on the wire
//!
//! Everything in here is pure and free of I/O.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod auth;
pub mod id;
pub mod model;
pub mod permission;
pub mod role;

pub use auth::{AuthorizationContext, Principal};
pub use model::{Bucket, File};
pub use permission::{Action, InvalidPermissionError, Permission};
pub use role::{InvalidRoleError, Role};
