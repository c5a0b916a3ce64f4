//! The resolved identity of a caller.
//!
//! An [`AuthorizationContext`] is built once per request from whatever credentials the caller
//! presented, and is then passed explicitly to every authorization decision. It is immutable.

use crate::role::Role;

/// Who a caller is, as far as authorization is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    /// An unauthenticated caller.
    Guest,
    /// An authenticated end user with the given ID.
    User(String),
    /// A caller using an administrative credential that is not bound to a user.
    Service,
}

/// The set of roles a caller holds for the duration of one request.
///
/// The role list is never empty and always starts with the shared roles: `any`, followed by
/// `users` for authenticated callers or `guests` for unauthenticated ones. After that come the
/// caller's own roles (`user:<id>`, team and membership roles) in the order they were resolved,
/// without duplicates.
///
/// Privileged callers authenticated with administrative credentials are flagged via
/// [`is_privileged`](Self::is_privileged).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationContext {
    principal: Principal,
    roles: Vec<Role>,
    privileged: bool,
}

impl AuthorizationContext {
    /// Creates a context for `principal`, holding the shared roles plus `roles`.
    ///
    /// The shared roles (`any`, `users`, `guests`) and the principal's own `user:<id>` role are
    /// derived from the principal; passing them in `roles` has no additional effect.
    pub fn new(
        principal: Principal,
        roles: impl IntoIterator<Item = Role>,
        privileged: bool,
    ) -> Self {
        let mut held = vec![Role::Any];
        match &principal {
            Principal::Guest => held.push(Role::Guests),
            Principal::User(id) => {
                held.push(Role::Users);
                held.push(Role::User(id.clone()));
            }
            Principal::Service => held.push(Role::Users),
        }

        for role in roles {
            if !role.is_shared() && !held.contains(&role) {
                held.push(role);
            }
        }

        Self {
            principal,
            roles: held,
            privileged,
        }
    }

    /// Returns the principal of this context.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the user ID of the caller, if it is an authenticated user.
    pub fn user_id(&self) -> Option<&str> {
        match &self.principal {
            Principal::User(id) => Some(id),
            Principal::Guest | Principal::Service => None,
        }
    }

    /// Returns `true` if the caller is unauthenticated.
    pub fn is_guest(&self) -> bool {
        self.principal == Principal::Guest
    }

    /// Returns `true` if the caller authenticated with administrative credentials.
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Returns all roles held by the caller, including the shared ones.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns the caller's own roles, excluding `any`, `users` and `guests`.
    pub fn own_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|role| !role.is_shared())
    }

    /// Returns `true` if the caller holds exactly this role.
    pub fn holds(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_roles() {
        let context = AuthorizationContext::new(Principal::Guest, [], false);
        assert_eq!(context.roles(), &[Role::Any, Role::Guests]);
        assert_eq!(context.own_roles().count(), 0);
        assert!(context.is_guest());
        assert_eq!(context.user_id(), None);
    }

    #[test]
    fn test_user_roles_are_ordered_and_deduplicated() {
        let team = Role::team("eng").unwrap();
        let context = AuthorizationContext::new(
            Principal::User("alice".into()),
            [
                team.clone(),
                Role::Any,
                Role::user("alice").unwrap(),
                team.clone(),
                Role::Guests,
            ],
            false,
        );

        assert_eq!(
            context.roles(),
            &[
                Role::Any,
                Role::Users,
                Role::User("alice".into()),
                team.clone()
            ]
        );
        assert_eq!(
            context.own_roles().collect::<Vec<_>>(),
            vec![&Role::User("alice".into()), &team]
        );
        assert_eq!(context.user_id(), Some("alice"));
        assert!(!context.is_guest());
    }

    #[test]
    fn test_service_is_not_a_guest() {
        let context = AuthorizationContext::new(Principal::Service, [], true);
        assert_eq!(context.roles(), &[Role::Any, Role::Users]);
        assert!(context.is_privileged());
        assert!(!context.is_guest());
        assert_eq!(context.user_id(), None);
    }
}
