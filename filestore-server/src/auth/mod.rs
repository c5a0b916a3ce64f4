//! Credential handling for filestore.
//!
//! Every request carries one of three kinds of credentials:
//!
//!  - an API key in the `x-filestore-key` header, which makes the caller privileged
//!  - a session token in the `Authorization: Bearer` header, which identifies a user
//!  - nothing, which makes the caller a guest
//!
//! The credentials are turned into [`IdentityFacts`](filestore_service::context::IdentityFacts)
//! and resolved into an [`AuthorizationContext`](filestore_types::AuthorizationContext), which
//! [`AuthAwareService`] passes to every service operation.
#![warn(missing_docs)]

mod error;
mod key_directory;
mod service;
mod session;

pub use error::*;
pub use key_directory::*;
pub use service::*;
pub use session::*;

/// The header carrying a privileged API key.
pub const API_KEY_HEADER: &str = "x-filestore-key";
