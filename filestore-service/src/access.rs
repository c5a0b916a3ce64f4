//! Resolution of effective access to buckets and files.
//!
//! Access checks use [`Role::matches`](filestore_types::Role::matches), which is permissive: a
//! grant to `users` admits every authenticated caller. With file security enabled on a bucket,
//! bucket and file grants are combined with a logical OR.

use filestore_types::{Action, AuthorizationContext, Bucket, File, Permission};

/// The caller is not authorized to perform an action on a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("the current user is not authorized to {action} this resource")]
pub struct AccessDeniedError {
    /// The action that was denied.
    pub action: Action,
}

/// Returns the permissions that govern access to `bucket`, or to `file` inside it.
///
/// Bucket permissions come first, followed by file permissions not already present. File
/// permissions are only considered if the bucket has file security enabled.
pub fn effective_permissions(bucket: &Bucket, file: Option<&File>) -> Vec<Permission> {
    let mut permissions = bucket.permissions.clone();
    if let Some(file) = file.filter(|_| bucket.file_security) {
        for permission in &file.permissions {
            if !permissions.contains(permission) {
                permissions.push(permission.clone());
            }
        }
    }
    permissions
}

/// Returns `true` if any of `permissions` grants `action` to a role matching the caller.
pub fn is_authorized(
    action: Action,
    permissions: &[Permission],
    context: &AuthorizationContext,
) -> bool {
    permissions
        .iter()
        .any(|p| p.action() == action && p.role().matches(context))
}

/// Authorizes `action` on `bucket`, or on `file` inside it.
///
/// Privileged callers are always authorized.
pub fn authorize(
    action: Action,
    bucket: &Bucket,
    file: Option<&File>,
    context: &AuthorizationContext,
) -> Result<(), AccessDeniedError> {
    if context.is_privileged() {
        return Ok(());
    }

    let permissions = effective_permissions(bucket, file);
    if is_authorized(action, &permissions, context) {
        return Ok(());
    }

    tracing::debug!(
        %action,
        bucket = %bucket.id,
        file = file.map(|f| f.id.as_str()),
        roles = ?context.roles(),
        "access denied"
    );
    Err(AccessDeniedError { action })
}
