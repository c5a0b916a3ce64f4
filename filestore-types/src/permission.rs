//! The permission grammar.
//!
//! A [`Permission`] grants one [`Action`] to one [`Role`] and is written as `action(role)`, for
//! example `read(any)` or `update(team:eng/owner)`. There is no whitespace anywhere in the string.
//! For compatibility with clients that quote the role, `read("any")` is accepted on input, but
//! permissions always serialize without quotes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::role::{InvalidRoleError, Role};

/// An operation that a permission can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Action {
    /// Create resources inside the resource, e.g. files inside a bucket.
    Create,
    /// Read the resource and its contents.
    Read,
    /// Update the resource.
    Update,
    /// Delete the resource.
    Delete,
}

impl Action {
    /// All actions, in canonical order.
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    /// Returns the keyword of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = InvalidPermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| InvalidPermissionError::UnknownAction(s.to_owned()))
    }
}

/// An error indicating that a permission string is invalid, returned by [`Permission::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPermissionError {
    /// The string is not of the form `action(role)`.
    #[error("permission `{0}` must have the form `action(role)`")]
    Syntax(String),
    /// The action is not one of `create`, `read`, `update`, `delete`.
    #[error("unknown permission action `{0}`")]
    UnknownAction(String),
    /// The role inside the parentheses is invalid.
    #[error("invalid role in permission `{permission}`: {source}")]
    Role {
        /// The full permission string.
        permission: String,
        /// The role error.
        #[source]
        source: InvalidRoleError,
    },
}

/// A grant of one [`Action`] to one [`Role`].
///
/// See the [module docs](self) for the grammar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Permission {
    action: Action,
    role: Role,
}

impl Permission {
    /// Creates a permission granting `action` to `role`.
    pub fn new(action: Action, role: Role) -> Self {
        Self { action, role }
    }

    /// Creates a `create(role)` permission.
    pub fn create(role: Role) -> Self {
        Self::new(Action::Create, role)
    }

    /// Creates a `read(role)` permission.
    pub fn read(role: Role) -> Self {
        Self::new(Action::Read, role)
    }

    /// Creates an `update(role)` permission.
    pub fn update(role: Role) -> Self {
        Self::new(Action::Update, role)
    }

    /// Creates a `delete(role)` permission.
    pub fn delete(role: Role) -> Self {
        Self::new(Action::Delete, role)
    }

    /// Parses a permission from its `action(role)` string form.
    ///
    /// # Examples
    ///
    /// ```
    /// use filestore_types::{Permission, Role};
    ///
    /// let permission = Permission::parse("read(user:alice)").unwrap();
    /// assert_eq!(permission, Permission::read(Role::user("alice").unwrap()));
    /// assert_eq!(permission.to_string(), "read(user:alice)");
    ///
    /// // Quoted roles are accepted, but never produced
    /// let quoted = Permission::parse(r#"read("user:alice")"#).unwrap();
    /// assert_eq!(quoted, permission);
    ///
    /// assert!(Permission::parse("read (any)").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidPermissionError> {
        let syntax_error = || InvalidPermissionError::Syntax(s.to_owned());

        let (action, rest) = s.split_once('(').ok_or_else(syntax_error)?;
        let inner = rest.strip_suffix(')').ok_or_else(syntax_error)?;
        let action = action.parse::<Action>()?;

        let inner = match inner.strip_prefix('"') {
            Some(quoted) => quoted.strip_suffix('"').ok_or_else(syntax_error)?,
            None => inner,
        };

        let role = Role::parse(inner).map_err(|source| InvalidPermissionError::Role {
            permission: s.to_owned(),
            source,
        })?;

        Ok(Self { action, role })
    }

    /// Returns the granted action.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns the role the action is granted to.
    pub fn role(&self) -> &Role {
        &self.role
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.action, self.role)
    }
}

impl FromStr for Permission {
    type Err = InvalidPermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s)
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Permission::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a list of permission strings, failing on the first invalid one.
pub fn parse_all<I, S>(permissions: I) -> Result<Vec<Permission>, InvalidPermissionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    permissions
        .into_iter()
        .map(|s| Permission::parse(s.as_ref()))
        .collect()
}
