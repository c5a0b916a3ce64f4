//! The file service and its configuration.
//!
//! [`FileService`] composes the authorization components with the record catalog and a payload
//! backend. Every operation takes the caller's [`AuthorizationContext`] explicitly.
//!
//! # Order of checks
//!
//! File operations run their checks in a fixed order:
//!
//!  1. The bucket must exist and be enabled. This runs before any permission check, so a
//!     disabled bucket rejects every caller alike.
//!  2. The caller must be authorized for the action via the effective permissions.
//!  3. Requested grants are validated: roles first, then actions.
//!  4. Uploads are checked against the bucket's size and extension policy.
//!
//! # Consistency
//!
//! On upload, the payload is written to the backend first. The file record is committed second,
//! with the bucket policy and the caller's `create` permission re-evaluated against the bucket
//! state at commit time. If the commit fails, the payload is rolled back. A file is therefore
//! never visible without its payload, and a concurrent bucket update cannot be bypassed.
//!
//! On delete, the record is removed first and the payload second. A failure to delete the payload
//! leaves an unreachable payload behind, which is logged.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use bytes::Bytes;
use filestore_types::id::validate_id;
use filestore_types::{Action, AuthorizationContext, Bucket, File, Permission};
use uuid::Uuid;

use crate::access::{authorize, effective_permissions, is_authorized};
use crate::backend::{BoxedBackend, InMemoryBackend, LocalFs, PayloadKey};
use crate::catalog::Catalog;
use crate::defaults::assign_default;
use crate::error::{Result, ServiceError};
use crate::policy::{PolicyGate, Upload};
use crate::validator::{ResourceKind, validate, validate_actions};

/// The placeholder ID that asks the service to generate a unique ID.
pub const UNIQUE_ID: &str = "unique()";

/// The maximum length of bucket and file names.
pub const MAX_NAME_LENGTH: usize = 128;

/// Configuration to initialize a [`FileService`].
#[derive(Debug, Clone)]
pub enum StorageConfig<'a> {
    /// Keep payloads in memory. Everything is lost on shutdown.
    Memory,
    /// Use a local filesystem directory as the storage backend.
    FileSystem {
        /// The path to the directory where payloads will be stored.
        path: &'a Path,
    },
}

/// The settings of a bucket, used for both creation and updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketParams {
    /// Bucket name.
    pub name: String,
    /// Bucket-level grants.
    pub permissions: Vec<Permission>,
    /// Whether file-level permissions are considered.
    pub file_security: bool,
    /// Whether the bucket can be accessed.
    pub enabled: bool,
    /// Maximum file size in bytes, `0` for the system default.
    pub maximum_file_size: u64,
    /// Accepted file extensions, in any case. Empty accepts all.
    pub allowed_file_extensions: Vec<String>,
    /// Whether payloads are encrypted at rest.
    pub encryption: bool,
    /// Whether payloads are scanned for viruses.
    pub antivirus: bool,
}

impl BucketParams {
    /// Creates parameters with default settings and no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
            file_security: false,
            enabled: true,
            maximum_file_size: 0,
            allowed_file_extensions: Vec::new(),
            encryption: true,
            antivirus: true,
        }
    }

    fn apply(self, bucket: &mut Bucket) {
        bucket.name = self.name;
        bucket.permissions = self.permissions;
        bucket.file_security = self.file_security;
        bucket.enabled = self.enabled;
        bucket.maximum_file_size = self.maximum_file_size;
        bucket.allowed_file_extensions = self
            .allowed_file_extensions
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect::<BTreeSet<_>>();
        bucket.encryption = self.encryption;
        bucket.antivirus = self.antivirus;
    }
}

/// A file to be uploaded.
#[derive(Clone, Debug)]
pub struct NewFile {
    /// The requested file ID, or [`UNIQUE_ID`].
    pub id: String,
    /// The file name, including its extension.
    pub name: String,
    /// The MIME type of the payload.
    pub mime_type: String,
    /// Requested file-level grants. `None` or an empty list applies the defaults.
    pub permissions: Option<Vec<Permission>>,
    /// The file contents.
    pub payload: Bytes,
}

/// Changes to an existing file.
#[derive(Clone, Debug, Default)]
pub struct FileUpdate {
    /// A new name, if given.
    pub name: Option<String>,
    /// New file-level grants. `None` keeps the current grants, an empty list applies the
    /// defaults.
    pub permissions: Option<Vec<Permission>>,
}

/// High-level asynchronous service for buckets and files.
#[derive(Clone, Debug)]
pub struct FileService(Arc<FileServiceInner>);

#[derive(Debug)]
struct FileServiceInner {
    backend: BoxedBackend,
    catalog: Catalog,
    gate: PolicyGate,
}

impl FileService {
    /// Creates a new `FileService` with the specified storage and bucket policy.
    pub async fn new(config: StorageConfig<'_>, gate: PolicyGate) -> anyhow::Result<Self> {
        let backend: BoxedBackend = match config {
            StorageConfig::Memory => Box::new(InMemoryBackend::new()),
            StorageConfig::FileSystem { path } => {
                tokio::fs::create_dir_all(path)
                    .await
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Box::new(LocalFs::new(path))
            }
        };

        tracing::debug!(backend = backend.name(), "initialized file service");
        Ok(Self::from_backend(backend, gate))
    }

    fn from_backend(backend: BoxedBackend, gate: PolicyGate) -> Self {
        Self(Arc::new(FileServiceInner {
            backend,
            catalog: Catalog::default(),
            gate,
        }))
    }

    /// Creates a bucket. Requires privileged credentials.
    pub fn create_bucket(
        &self,
        context: &AuthorizationContext,
        id: &str,
        params: BucketParams,
    ) -> Result<Bucket> {
        require_privileged(context)?;
        self.check_bucket_params(context, &params)?;

        let mut bucket = Bucket::new(resolve_id(id)?, String::new());
        params.apply(&mut bucket);
        let bucket = self.0.catalog.insert_bucket(bucket)?;

        tracing::debug!(bucket = %bucket.id, "created bucket");
        Ok(bucket)
    }

    /// Lists all buckets. Requires privileged credentials.
    pub fn list_buckets(&self, context: &AuthorizationContext) -> Result<Vec<Bucket>> {
        require_privileged(context)?;
        Ok(self.0.catalog.list_buckets())
    }

    /// Returns a bucket. Requires privileged credentials.
    pub fn get_bucket(&self, context: &AuthorizationContext, id: &str) -> Result<Bucket> {
        require_privileged(context)?;
        self.0.catalog.get_bucket(id)
    }

    /// Replaces the settings of a bucket. Requires privileged credentials.
    ///
    /// Disabled buckets can be updated, so that they can be enabled again.
    pub fn update_bucket(
        &self,
        context: &AuthorizationContext,
        id: &str,
        params: BucketParams,
    ) -> Result<Bucket> {
        require_privileged(context)?;
        self.check_bucket_params(context, &params)?;

        self.0.catalog.update_bucket(id, |bucket| {
            params.apply(bucket);
            bucket.updated_at = SystemTime::now();
            Ok(())
        })
    }

    /// Deletes a bucket with all of its files. Requires privileged credentials.
    pub async fn delete_bucket(&self, context: &AuthorizationContext, id: &str) -> Result<()> {
        require_privileged(context)?;

        let payloads = self.0.catalog.remove_bucket(id)?;
        tracing::debug!(bucket = id, files = payloads.len(), "deleted bucket");
        for payload in payloads {
            self.delete_payload(&payload).await;
        }
        Ok(())
    }

    /// Uploads a new file into a bucket.
    pub async fn create_file(
        &self,
        context: &AuthorizationContext,
        bucket_id: &str,
        new: NewFile,
    ) -> Result<File> {
        let gate = &self.0.gate;
        let bucket = self.0.catalog.get_bucket(bucket_id)?;
        gate.ensure_enabled(&bucket)?;
        authorize(Action::Create, &bucket, None, context)?;

        let permissions = match new.permissions {
            Some(requested) if !requested.is_empty() => {
                check_grants(context, &requested, ResourceKind::File)?;
                requested
            }
            _ => assign_default(context),
        };

        let name = check_name(new.name)?;
        let size = new.payload.len() as u64;
        let upload = Upload { name: &name, size };
        gate.check_upload(&bucket, &upload)?;

        let now = SystemTime::now();
        let file = File {
            id: resolve_id(&new.id)?,
            bucket_id: bucket.id.clone(),
            created_at: now,
            updated_at: now,
            permissions,
            name: name.clone(),
            mime_type: new.mime_type,
            size_original: size,
        };

        let payload = PayloadKey::new(&file.bucket_id, &file.id);
        self.0.backend.put_payload(&payload, new.payload).await?;

        let committed = self.0.catalog.insert_file(file, payload.clone(), |bucket| {
            gate.check_upload(bucket, &upload)?;
            authorize(Action::Create, bucket, None, context)?;
            Ok(())
        });

        match committed {
            Ok(file) => {
                tracing::debug!(bucket = bucket_id, file = %file.id, size, "created file");
                Ok(file)
            }
            Err(err) => {
                self.delete_payload(&payload).await;
                Err(err)
            }
        }
    }

    /// Lists the files in a bucket that the caller may read.
    ///
    /// If the bucket grants `read` to the caller, all files are returned. Otherwise, with file
    /// security enabled, only the files granting `read` themselves are returned.
    pub fn list_files(&self, context: &AuthorizationContext, bucket_id: &str) -> Result<Vec<File>> {
        let (bucket, files) = self.0.catalog.list_files(bucket_id)?;
        self.0.gate.ensure_enabled(&bucket)?;

        match authorize(Action::Read, &bucket, None, context) {
            Ok(()) => Ok(files),
            Err(_) if bucket.file_security => Ok(files
                .into_iter()
                .filter(|file| {
                    let permissions = effective_permissions(&bucket, Some(file));
                    is_authorized(Action::Read, &permissions, context)
                })
                .collect()),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns a file's record.
    pub fn get_file(
        &self,
        context: &AuthorizationContext,
        bucket_id: &str,
        file_id: &str,
    ) -> Result<File> {
        let record = self.0.catalog.get_file(bucket_id, file_id)?;
        self.0.gate.ensure_enabled(&record.bucket)?;
        authorize(Action::Read, &record.bucket, Some(&record.file), context)?;
        Ok(record.file)
    }

    /// Returns a file's record together with its contents.
    pub async fn read_file(
        &self,
        context: &AuthorizationContext,
        bucket_id: &str,
        file_id: &str,
    ) -> Result<(File, Bytes)> {
        let record = self.0.catalog.get_file(bucket_id, file_id)?;
        self.0.gate.ensure_enabled(&record.bucket)?;
        authorize(Action::Read, &record.bucket, Some(&record.file), context)?;

        match self.0.backend.get_payload(&record.payload).await? {
            Some(payload) => Ok((record.file, payload)),
            // The file was deleted concurrently.
            None => Err(ServiceError::FileNotFound(file_id.to_owned())),
        }
    }

    /// Updates a file's name or permissions.
    pub fn update_file(
        &self,
        context: &AuthorizationContext,
        bucket_id: &str,
        file_id: &str,
        update: FileUpdate,
    ) -> Result<File> {
        let name = update.name.map(check_name).transpose()?;
        let gate = &self.0.gate;

        self.0.catalog.update_file(bucket_id, file_id, |bucket, file| {
            gate.ensure_enabled(bucket)?;
            authorize(Action::Update, bucket, Some(file), context)?;

            match update.permissions {
                Some(requested) if requested.is_empty() => {
                    file.permissions = assign_default(context);
                }
                Some(requested) => {
                    check_grants(context, &requested, ResourceKind::File)?;
                    file.permissions = requested;
                }
                None => (),
            }

            if let Some(name) = name {
                file.name = name;
            }
            file.updated_at = SystemTime::now();
            Ok(())
        })
    }

    /// Deletes a file and its contents.
    pub async fn delete_file(
        &self,
        context: &AuthorizationContext,
        bucket_id: &str,
        file_id: &str,
    ) -> Result<()> {
        let gate = &self.0.gate;
        let payload = self.0.catalog.remove_file(bucket_id, file_id, |bucket, file| {
            gate.ensure_enabled(bucket)?;
            authorize(Action::Delete, bucket, Some(file), context)?;
            Ok(())
        })?;

        tracing::debug!(bucket = bucket_id, file = file_id, "deleted file");
        self.delete_payload(&payload).await;
        Ok(())
    }

    fn check_bucket_params(
        &self,
        context: &AuthorizationContext,
        params: &BucketParams,
    ) -> Result<()> {
        check_name(params.name.clone())?;
        check_grants(context, &params.permissions, ResourceKind::Bucket)?;
        self.0.gate.check_bucket_limit(params.maximum_file_size)?;
        Ok(())
    }

    async fn delete_payload(&self, payload: &PayloadKey) {
        if let Err(error) = self.0.backend.delete_payload(payload).await {
            tracing::error!(
                error = &error as &dyn std::error::Error,
                payload = %payload,
                backend = self.0.backend.name(),
                "failed to delete payload"
            );
        }
    }
}

fn require_privileged(context: &AuthorizationContext) -> Result<()> {
    if context.is_privileged() {
        Ok(())
    } else {
        tracing::debug!(roles = ?context.roles(), "rejected unprivileged caller");
        Err(ServiceError::PrivilegedRequired)
    }
}

fn check_grants(
    context: &AuthorizationContext,
    requested: &[Permission],
    kind: ResourceKind,
) -> Result<()> {
    validate(requested, context, context.is_privileged())?;
    validate_actions(requested, kind)?;
    Ok(())
}

fn check_name(name: String) -> Result<String> {
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "name must not be longer than {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

/// Validates a caller-supplied ID, or generates one for [`UNIQUE_ID`].
fn resolve_id(id: &str) -> Result<String> {
    if id == UNIQUE_ID {
        return Ok(Uuid::new_v4().simple().to_string());
    }
    validate_id(id)?;
    Ok(id.to_owned())
}

#[cfg(test)]
mod tests {
    use filestore_types::permission::parse_all;
    use filestore_types::{Principal, Role};

    use crate::access::AccessDeniedError;
    use crate::policy::PolicyError;
    use crate::validator::ForbiddenRoleError;

    use super::*;

    fn service() -> (FileService, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        let service = FileService::from_backend(Box::new(backend.clone()), PolicyGate::new(0));
        (service, backend)
    }

    fn admin() -> AuthorizationContext {
        AuthorizationContext::new(Principal::Service, [], true)
    }

    fn user(id: &str) -> AuthorizationContext {
        AuthorizationContext::new(Principal::User(id.into()), [], false)
    }

    fn guest() -> AuthorizationContext {
        AuthorizationContext::new(Principal::Guest, [], false)
    }

    fn bucket_params(permissions: &[&str]) -> BucketParams {
        BucketParams {
            permissions: parse_all(permissions).unwrap(),
            ..BucketParams::new("Test Bucket")
        }
    }

    fn new_file(id: &str, permissions: Option<&[&str]>) -> NewFile {
        NewFile {
            id: id.into(),
            name: "permissions.png".into(),
            mime_type: "image/png".into(),
            permissions: permissions.map(|p| parse_all(p).unwrap()),
            payload: Bytes::from_static(b"payload"),
        }
    }

    const OPEN_BUCKET: &[&str] = &["read(any)", "create(users)", "update(users)", "delete(users)"];

    #[tokio::test]
    async fn test_default_permissions_and_forbidden_grant() {
        let (service, _) = service();
        let bucket = service
            .create_bucket(&admin(), UNIQUE_ID, bucket_params(OPEN_BUCKET))
            .unwrap();

        let alice = user("alice");
        let file = service
            .create_file(&alice, &bucket.id, new_file(UNIQUE_ID, None))
            .await
            .unwrap();
        let rendered: Vec<String> = file.permissions.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["read(user:alice)", "update(user:alice)", "delete(user:alice)"]
        );

        let err = service
            .create_file(
                &alice,
                &bucket.id,
                new_file(UNIQUE_ID, Some(&["read(user:notme)"])),
            )
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Permissions must be one of: any, users, user:alice")
        );
    }

    #[tokio::test]
    async fn test_guest_cannot_upload_into_users_bucket() {
        let (service, backend) = service();
        service
            .create_bucket(&admin(), "b1", bucket_params(OPEN_BUCKET))
            .unwrap();

        let err = service
            .create_file(&guest(), "b1", new_file("f1", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AccessDenied(AccessDeniedError {
                action: Action::Create
            })
        ));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_bucket_checked_before_permissions() {
        let (service, _) = service();
        let params = BucketParams {
            enabled: false,
            ..bucket_params(&[])
        };
        service.create_bucket(&admin(), "b1", params).unwrap();

        // Neither caller has any grant, but both see the policy error
        for context in [guest(), user("alice")] {
            let err = service
                .create_file(&context, "b1", new_file("f1", Some(&["read(user:notme)"])))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Policy(PolicyError::BucketDisabled(_))
            ));

            let err = service.list_files(&context, "b1").unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Policy(PolicyError::BucketDisabled(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_file_security_grants_access() {
        let (service, _) = service();
        let params = BucketParams {
            file_security: true,
            ..bucket_params(&["create(users)"])
        };
        service.create_bucket(&admin(), "b1", params).unwrap();

        let alice = user("alice");
        let bob = user("bob");
        service
            .create_file(&alice, "b1", new_file("private", None))
            .await
            .unwrap();
        service
            .create_file(&bob, "b1", new_file("shared", Some(&["read(any)"])))
            .await
            .unwrap();

        // The file grant admits alice although the bucket grants no read
        let (file, payload) = service.read_file(&alice, "b1", "private").await.unwrap();
        assert_eq!(file.id, "private");
        assert_eq!(payload, Bytes::from_static(b"payload"));

        let err = service.get_file(&bob, "b1", "private").unwrap_err();
        assert!(matches!(err, ServiceError::AccessDenied(_)));

        let ids = |files: Vec<File>| files.into_iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(
            ids(service.list_files(&alice, "b1").unwrap()),
            ["private", "shared"]
        );
        assert_eq!(ids(service.list_files(&bob, "b1").unwrap()), ["shared"]);
        assert_eq!(ids(service.list_files(&guest(), "b1").unwrap()), ["shared"]);
    }

    #[tokio::test]
    async fn test_file_grants_ignored_without_file_security() {
        let (service, _) = service();
        service
            .create_bucket(&admin(), "b1", bucket_params(&["create(users)"]))
            .unwrap();

        let alice = user("alice");
        service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap();

        assert!(matches!(
            service.get_file(&alice, "b1", "f1"),
            Err(ServiceError::AccessDenied(_))
        ));
        assert!(matches!(
            service.list_files(&alice, "b1"),
            Err(ServiceError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_file_rolls_back_payload() {
        let (service, backend) = service();
        service
            .create_bucket(&admin(), "b1", bucket_params(OPEN_BUCKET))
            .unwrap();

        let alice = user("alice");
        service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap();
        let err = service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FileExists(_)));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_policy() {
        let (service, backend) = service();
        let params = BucketParams {
            maximum_file_size: 4,
            allowed_file_extensions: vec!["PNG".into()],
            ..bucket_params(OPEN_BUCKET)
        };
        let bucket = service.create_bucket(&admin(), "b1", params).unwrap();
        assert!(bucket.allowed_file_extensions.contains("png"));

        let alice = user("alice");
        let err = service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::FileTooLarge { size: 7, limit: 4 })
        ));

        let mut file = new_file("f1", None);
        file.name = "notes.txt".into();
        file.payload = Bytes::from_static(b"tiny");
        let err = service.create_file(&alice, "b1", file).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::ExtensionNotAllowed(_))
        ));
        assert!(backend.is_empty());
    }

    #[test]
    fn test_bucket_limit_bounded_by_upload_limit() {
        let gate = PolicyGate::new(0).with_upload_limit(1024);
        let service = FileService::from_backend(Box::new(InMemoryBackend::new()), gate);

        let params = BucketParams {
            maximum_file_size: 1_000_000,
            ..bucket_params(OPEN_BUCKET)
        };
        let err = service.create_bucket(&admin(), "b1", params).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::BucketLimitTooLarge {
                requested: 1_000_000,
                limit: 1024
            })
        ));

        let params = BucketParams {
            maximum_file_size: 512,
            ..bucket_params(OPEN_BUCKET)
        };
        service.create_bucket(&admin(), "b1", params).unwrap();

        let params = BucketParams {
            maximum_file_size: 2048,
            ..bucket_params(OPEN_BUCKET)
        };
        let err = service.update_bucket(&admin(), "b1", params).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::BucketLimitTooLarge { .. })
        ));
        let bucket = service.get_bucket(&admin(), "b1").unwrap();
        assert_eq!(bucket.maximum_file_size, 512);
    }

    #[tokio::test]
    async fn test_update_file_permissions() {
        let (service, _) = service();
        service
            .create_bucket(&admin(), "b1", bucket_params(OPEN_BUCKET))
            .unwrap();
        let alice = user("alice");
        service
            .create_file(&alice, "b1", new_file("f1", Some(&["read(any)"])))
            .await
            .unwrap();

        // Absent permissions keep the current grants
        let update = FileUpdate {
            name: Some("renamed.png".into()),
            permissions: None,
        };
        let file = service.update_file(&alice, "b1", "f1", update).unwrap();
        assert_eq!(file.name, "renamed.png");
        assert_eq!(file.permissions, [Permission::read(Role::Any)]);

        // Empty permissions apply the defaults
        let update = FileUpdate {
            name: None,
            permissions: Some(Vec::new()),
        };
        let file = service.update_file(&alice, "b1", "f1", update).unwrap();
        assert_eq!(file.permissions.len(), 3);

        let update = FileUpdate {
            name: None,
            permissions: Some(parse_all(["update(user:notme)"]).unwrap()),
        };
        let err = service
            .update_file(&alice, "b1", "f1", update)
            .unwrap_err();
        let ServiceError::ForbiddenRole(ForbiddenRoleError { allowed_roles, .. }) = err else {
            panic!("expected forbidden role");
        };
        assert_eq!(allowed_roles.len(), 3);

        let update = FileUpdate {
            name: None,
            permissions: Some(parse_all(["create(users)"]).unwrap()),
        };
        let err = service
            .update_file(&alice, "b1", "f1", update)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ActionNotAllowed(_)));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let (service, backend) = service();
        service
            .create_bucket(&admin(), "b1", bucket_params(&["create(users)", "read(any)"]))
            .unwrap();
        let alice = user("alice");
        let bob = user("bob");
        service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap();

        let err = service.delete_file(&bob, "b1", "f1").await.unwrap_err();
        assert!(matches!(err, ServiceError::AccessDenied(_)));

        service.delete_file(&admin(), "b1", "f1").await.unwrap();
        assert!(backend.is_empty());
        assert!(matches!(
            service.get_file(&alice, "b1", "f1"),
            Err(ServiceError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bucket_management_requires_privilege() {
        let (service, backend) = service();
        let alice = user("alice");

        let err = service
            .create_bucket(&alice, "b1", bucket_params(&[]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::PrivilegedRequired));

        service
            .create_bucket(&admin(), "b1", bucket_params(OPEN_BUCKET))
            .unwrap();
        service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap();

        assert!(service.list_buckets(&alice).is_err());
        assert!(service.delete_bucket(&alice, "b1").await.is_err());

        let disabled = BucketParams {
            enabled: false,
            ..bucket_params(OPEN_BUCKET)
        };
        let bucket = service.update_bucket(&admin(), "b1", disabled).unwrap();
        assert!(!bucket.enabled);
        assert_eq!(service.get_bucket(&admin(), "b1").unwrap(), bucket);

        service.delete_bucket(&admin(), "b1").await.unwrap();
        assert!(backend.is_empty());
        assert!(service.list_buckets(&admin()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids() {
        let (service, _) = service();
        let bucket = service
            .create_bucket(&admin(), UNIQUE_ID, bucket_params(&[]))
            .unwrap();
        assert_eq!(bucket.id.len(), 32);

        let err = service
            .create_bucket(&admin(), "-bad", bucket_params(&[]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidId(_)));

        service
            .create_bucket(&admin(), "b1", bucket_params(&[]))
            .unwrap();
        let err = service
            .create_bucket(&admin(), "b1", bucket_params(&[]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::BucketExists(_)));

        let err = service
            .create_bucket(&admin(), "b2", BucketParams::new(""))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_filesystem_storage() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("files");
        let service = FileService::new(StorageConfig::FileSystem { path: &path }, PolicyGate::new(0))
            .await
            .unwrap();
        assert!(path.is_dir());

        service
            .create_bucket(&admin(), "b1", bucket_params(OPEN_BUCKET))
            .unwrap();
        let alice = user("alice");
        service
            .create_file(&alice, "b1", new_file("f1", None))
            .await
            .unwrap();
        let (_, payload) = service.read_file(&guest(), "b1", "f1").await.unwrap();
        assert_eq!(payload, Bytes::from_static(b"payload"));
    }
}
