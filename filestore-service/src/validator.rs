//! Validation of requested permission grants.
//!
//! Granting is stricter than access checking: a scoped caller may only grant `any`, `users`, or
//! a role it holds itself, compared by exact equality. Privileged callers may grant anything.

use std::fmt;

use filestore_types::{Action, AuthorizationContext, Permission, Role};

/// A caller attempted to grant a role outside of its authority.
///
/// The error message enumerates every role the caller may grant, in a stable order, so that the
/// caller can correct the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Permissions must be one of: {}", render_roles(.allowed_roles))]
pub struct ForbiddenRoleError {
    /// The roles the caller is allowed to grant.
    pub allowed_roles: Vec<Role>,
    /// The first requested role that is not allowed.
    pub role: Role,
}

fn render_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns the roles a scoped caller may grant: `any`, `users`, then its own roles.
pub fn allowed_roles(context: &AuthorizationContext) -> Vec<Role> {
    let mut allowed = vec![Role::Any, Role::Users];
    allowed.extend(context.own_roles().cloned());
    allowed
}

/// Checks that every requested permission grants a role the caller may grant.
///
/// An empty request is always valid. With `privileged` set, any request is accepted.
pub fn validate(
    requested: &[Permission],
    context: &AuthorizationContext,
    privileged: bool,
) -> Result<(), ForbiddenRoleError> {
    if privileged || requested.is_empty() {
        return Ok(());
    }

    let allowed = allowed_roles(context);
    match requested.iter().find(|p| !allowed.contains(p.role())) {
        Some(permission) => {
            tracing::debug!(
                permission = %permission,
                roles = ?context.roles(),
                "rejected permission grant outside of caller authority"
            );
            Err(ForbiddenRoleError {
                role: permission.role().clone(),
                allowed_roles: allowed,
            })
        }
        None => Ok(()),
    }
}

/// The kind of resource permissions are granted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A bucket; its grants cover the bucket and, by default, all of its files.
    Bucket,
    /// A single file.
    File,
}

impl ResourceKind {
    /// Returns the actions that can be granted on this kind of resource.
    pub fn allowed_actions(self) -> &'static [Action] {
        match self {
            ResourceKind::Bucket => &Action::ALL,
            ResourceKind::File => &[Action::Read, Action::Update, Action::Delete],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Bucket => f.write_str("bucket"),
            ResourceKind::File => f.write_str("file"),
        }
    }
}

/// A permission grants an action that does not apply to the resource kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("permission `{permission}` cannot be granted on a {kind}")]
pub struct ActionNotAllowedError {
    /// The offending permission.
    pub permission: Permission,
    /// The resource kind it was requested on.
    pub kind: ResourceKind,
}

/// Checks that every requested permission uses an action allowed on `kind`.
pub fn validate_actions(
    requested: &[Permission],
    kind: ResourceKind,
) -> Result<(), ActionNotAllowedError> {
    let allowed = kind.allowed_actions();
    match requested.iter().find(|p| !allowed.contains(&p.action())) {
        Some(permission) => Err(ActionNotAllowedError {
            permission: permission.clone(),
            kind,
        }),
        None => Ok(()),
    }
}
