//! Validation of resource and identity IDs.
//!
//! Bucket IDs, file IDs, user IDs, team IDs and membership IDs all share one format: up to
//! [`MAX_ID_LENGTH`] characters out of `[A-Za-z0-9._-]`, not starting with `.`, `_` or `-`.
//! This keeps IDs safe to embed in role strings and storage paths.

/// Maximum length of an ID.
pub const MAX_ID_LENGTH: usize = 36;

/// Characters allowed in an ID.
///
/// Excludes the separators of the role and permission grammars (`:`, `/`, `(`, `)`), which also
/// keeps IDs free of path separators when used as storage paths.
const ALLOWED_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789._-";

/// An error indicating that an ID is invalid, returned by [`validate_id`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIdError {
    /// The ID is empty.
    #[error("ID must not be empty")]
    Empty,
    /// The ID contains a character outside of `[A-Za-z0-9._-]`.
    #[error("invalid character '{0}' in ID")]
    InvalidChar(char),
    /// The ID starts with `.`, `_` or `-`.
    #[error("ID must not start with '{0}'")]
    LeadingSpecialChar(char),
    /// The ID exceeds [`MAX_ID_LENGTH`].
    #[error("ID is {0} characters long, exceeds maximum of {MAX_ID_LENGTH}")]
    TooLong(usize),
}

/// Checks that `id` is a well-formed ID.
///
/// # Examples
///
/// ```
/// use filestore_types::id::{InvalidIdError, validate_id};
///
/// assert!(validate_id("5e5ea5c16897e").is_ok());
/// assert_eq!(validate_id("-x"), Err(InvalidIdError::LeadingSpecialChar('-')));
/// ```
pub fn validate_id(id: &str) -> Result<(), InvalidIdError> {
    let Some(first) = id.chars().next() else {
        return Err(InvalidIdError::Empty);
    };

    if let Some(c) = id.chars().find(|c| !ALLOWED_CHARS.contains(*c)) {
        return Err(InvalidIdError::InvalidChar(c));
    }
    if matches!(first, '.' | '_' | '-') {
        return Err(InvalidIdError::LeadingSpecialChar(first));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(InvalidIdError::TooLong(id.len()));
    }

    Ok(())
}
