//! Resolution of caller identities into [`AuthorizationContext`]s.
//!
//! The credential layer only knows raw facts about a caller: a user ID from a session, whether a
//! privileged key was used, and which teams the user belongs to. [`resolve`] turns those facts
//! into the role set that all authorization decisions are based on.

use filestore_types::{AuthorizationContext, InvalidRoleError, Principal, Role};

/// A user's membership in a team, as reported by the credential layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeamMembership {
    /// The team ID.
    pub team_id: String,
    /// The ID of the membership record.
    pub membership_id: String,
    /// Roles held inside the team, such as `owner`.
    pub roles: Vec<String>,
}

/// Raw facts about a caller's identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityFacts {
    /// The ID of the authenticated user, if any.
    pub user_id: Option<String>,
    /// Whether the caller was established as an unauthenticated guest.
    pub guest: bool,
    /// Whether the caller presented administrative credentials.
    pub privileged: bool,
    /// The user's team memberships.
    pub memberships: Vec<TeamMembership>,
}

impl IdentityFacts {
    /// Facts for an unauthenticated caller.
    pub fn guest() -> Self {
        Self {
            guest: true,
            ..Default::default()
        }
    }

    /// Facts for an authenticated user without team memberships.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Facts for a caller using administrative credentials.
    pub fn privileged() -> Self {
        Self {
            privileged: true,
            ..Default::default()
        }
    }

    /// Adds a team membership to these facts.
    pub fn with_membership(mut self, membership: TeamMembership) -> Self {
        self.memberships.push(membership);
        self
    }
}

/// An error indicating that no identity could be established for a caller.
///
/// This is distinct from a guest: guests are a valid identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnauthenticatedError {
    /// The facts describe neither a user, nor a privileged caller, nor a guest.
    #[error("no caller identity could be established")]
    NoIdentity,
    /// The facts contain an ID that cannot be turned into a role.
    #[error("invalid caller identity: {0}")]
    InvalidIdentity(#[from] InvalidRoleError),
}

/// Builds the [`AuthorizationContext`] for a caller from its identity facts.
///
/// A user ID takes precedence over the guest flag. Privileged callers without a user ID resolve
/// to [`Principal::Service`]. Every team membership contributes `team:<id>`, one
/// `team:<id>/<role>` per team role, and `member:<id>`, in that order.
pub fn resolve(facts: &IdentityFacts) -> Result<AuthorizationContext, UnauthenticatedError> {
    let Some(user_id) = &facts.user_id else {
        let principal = if facts.privileged {
            Principal::Service
        } else if facts.guest {
            Principal::Guest
        } else {
            return Err(UnauthenticatedError::NoIdentity);
        };
        return Ok(AuthorizationContext::new(principal, [], facts.privileged));
    };

    let mut roles = vec![Role::user(user_id)?];
    for membership in &facts.memberships {
        roles.push(Role::team(&membership.team_id)?);
        for team_role in &membership.roles {
            roles.push(Role::team_role(&membership.team_id, team_role)?);
        }
        roles.push(Role::member(&membership.membership_id)?);
    }

    Ok(AuthorizationContext::new(
        Principal::User(user_id.clone()),
        roles,
        facts.privileged,
    ))
}
