//! Default permissions for resources created without explicit grants.

use filestore_types::{AuthorizationContext, Permission, Role};

/// Returns the permissions applied when a caller supplies none.
///
/// An authenticated user receives `read`, `update` and `delete` on its own `user:<id>` role.
/// There is no default `create` grant. Callers without a user identity, such as guests or
/// privileged service callers, receive no defaults.
pub fn assign_default(context: &AuthorizationContext) -> Vec<Permission> {
    let Some(user_id) = context.user_id() else {
        return Vec::new();
    };

    let role = Role::User(user_id.to_owned());
    vec![
        Permission::read(role.clone()),
        Permission::update(role.clone()),
        Permission::delete(role),
    ]
}
