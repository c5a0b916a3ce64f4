//! Definitions for roles.
//!
//! A [`Role`] names the set of callers a permission is granted to. The set of roles is closed:
//!
//!  - `any`: every caller, including unauthenticated ones
//!  - `users`: every authenticated caller
//!  - `guests`: every unauthenticated caller
//!  - `user:<id>`: one specific user
//!  - `team:<id>`: every member of a team
//!  - `team:<id>/<role>`: members holding a named role inside a team
//!  - `member:<id>`: one specific team membership
//!
//! The string form is canonical. Two roles are equal iff their string forms are equal, and
//! [`Role::parse`] maps every valid string to exactly one variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::auth::AuthorizationContext;
use crate::id::{InvalidIdError, validate_id};

/// An error indicating that a role string is invalid, returned by [`Role::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRoleError {
    /// The role string is empty.
    #[error("role must not be empty")]
    Empty,
    /// The role does not start with a known keyword or prefix.
    #[error("unknown role `{0}`")]
    Unknown(String),
    /// A prefixed role such as `user:` is missing its identifier.
    #[error("role `{0}` requires an identifier")]
    MissingId(&'static str),
    /// A `/<role>` suffix was given on a role that does not support it.
    #[error("role `{0}` does not support a sub-role")]
    UnexpectedSubRole(&'static str),
    /// An identifier or team sub-role is malformed.
    #[error("invalid identifier in role: {0}")]
    InvalidId(#[from] InvalidIdError),
}

/// The set of callers a permission applies to.
///
/// See the [module docs](self) for the grammar.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Role {
    /// Every caller, authenticated or not.
    Any,
    /// Every authenticated caller.
    Users,
    /// Every unauthenticated caller.
    Guests,
    /// A single user, identified by its ID.
    User(String),
    /// Every member of a team, or only the members holding `role` in it.
    Team {
        /// The team ID.
        id: String,
        /// An optional role inside the team, such as `owner`.
        role: Option<String>,
    },
    /// A single team membership, identified by its ID.
    Member(String),
}

impl Role {
    /// Parses a role from its canonical string form.
    ///
    /// # Examples
    ///
    /// ```
    /// use filestore_types::Role;
    ///
    /// let role = Role::parse("team:engineering/owner").unwrap();
    /// assert_eq!(role, Role::team_role("engineering", "owner").unwrap());
    ///
    /// // Unknown prefixes are rejected
    /// assert!(Role::parse("label:vip").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidRoleError> {
        if s.is_empty() {
            return Err(InvalidRoleError::Empty);
        }

        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind, Some(rest)),
            None => (s, None),
        };

        match (kind, rest) {
            ("any", None) => Ok(Role::Any),
            ("users", None) => Ok(Role::Users),
            ("guests", None) => Ok(Role::Guests),
            ("user", Some(rest)) => {
                let (id, sub) = split_sub_role(rest);
                if sub.is_some() {
                    return Err(InvalidRoleError::UnexpectedSubRole("user"));
                }
                Ok(Role::User(checked_id(id, "user")?))
            }
            ("team", Some(rest)) => {
                let (id, sub) = split_sub_role(rest);
                let id = checked_id(id, "team")?;
                let role = sub.map(|sub| checked_id(sub, "team")).transpose()?;
                Ok(Role::Team { id, role })
            }
            ("member", Some(rest)) => {
                let (id, sub) = split_sub_role(rest);
                if sub.is_some() {
                    return Err(InvalidRoleError::UnexpectedSubRole("member"));
                }
                Ok(Role::Member(checked_id(id, "member")?))
            }
            _ => Err(InvalidRoleError::Unknown(s.to_owned())),
        }
    }

    /// Creates a validated `user:<id>` role.
    pub fn user(id: &str) -> Result<Self, InvalidRoleError> {
        Ok(Role::User(checked_id(id, "user")?))
    }

    /// Creates a validated `team:<id>` role.
    pub fn team(id: &str) -> Result<Self, InvalidRoleError> {
        Ok(Role::Team {
            id: checked_id(id, "team")?,
            role: None,
        })
    }

    /// Creates a validated `team:<id>/<role>` role.
    pub fn team_role(id: &str, role: &str) -> Result<Self, InvalidRoleError> {
        Ok(Role::Team {
            id: checked_id(id, "team")?,
            role: Some(checked_id(role, "team")?),
        })
    }

    /// Creates a validated `member:<id>` role.
    pub fn member(id: &str) -> Result<Self, InvalidRoleError> {
        Ok(Role::Member(checked_id(id, "member")?))
    }

    /// Returns `true` for the roles every caller of a kind holds: `any`, `users` and `guests`.
    pub fn is_shared(&self) -> bool {
        matches!(self, Role::Any | Role::Users | Role::Guests)
    }

    /// Returns `true` if a caller with the given context is covered by this role.
    ///
    /// Matching is permissive: `any` covers everyone, `users` covers every caller that is not a
    /// guest, and `guests` covers only guests. Specific roles are covered if they name the
    /// caller's own user ID, or if the context holds them. Team membership is never looked up
    /// here; the context must already carry the team roles.
    pub fn matches(&self, context: &AuthorizationContext) -> bool {
        match self {
            Role::Any => true,
            Role::Users => !context.is_guest(),
            Role::Guests => context.is_guest(),
            Role::User(id) => context.user_id() == Some(id.as_str()),
            Role::Team { .. } | Role::Member(_) => context.holds(self),
        }
    }
}

fn split_sub_role(s: &str) -> (&str, Option<&str>) {
    match s.split_once('/') {
        Some((id, sub)) => (id, Some(sub)),
        None => (s, None),
    }
}

fn checked_id(id: &str, kind: &'static str) -> Result<String, InvalidRoleError> {
    match validate_id(id) {
        Ok(()) => Ok(id.to_owned()),
        Err(InvalidIdError::Empty) => Err(InvalidRoleError::MissingId(kind)),
        Err(err) => Err(err.into()),
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Any => f.write_str("any"),
            Role::Users => f.write_str("users"),
            Role::Guests => f.write_str("guests"),
            Role::User(id) => write!(f, "user:{id}"),
            Role::Team { id, role: None } => write!(f, "team:{id}"),
            Role::Team {
                id,
                role: Some(role),
            } => write!(f, "team:{id}/{role}"),
            Role::Member(id) => write!(f, "member:{id}"),
        }
    }
}

impl FromStr for Role {
    type Err = InvalidRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Role::parse(&s).map_err(serde::de::Error::custom)
    }
}
