use bytes::Bytes;
use filestore_service::{BucketParams, FileService, FileUpdate, NewFile, Result};
use filestore_types::{AuthorizationContext, Bucket, File};

/// Wrapper around [`FileService`] that binds every operation to the caller's context.
///
/// The context is resolved from the request's credentials, see [`crate::auth`]. Endpoints can use
/// `AuthAwareService` simply by adding it to their handler function's argument list like so:
///
/// ```
/// use axum::http::StatusCode;
/// use filestore_server::auth::AuthAwareService;
///
/// async fn my_endpoint(service: AuthAwareService) -> Result<StatusCode, StatusCode> {
///     service.delete_file("photos", todo!("pass some ID"))
///         .await
///         .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
///
///     Ok(StatusCode::NO_CONTENT)
/// }
/// ```
#[derive(Debug)]
pub struct AuthAwareService {
    service: FileService,
    context: AuthorizationContext,
}

impl AuthAwareService {
    /// Creates a new `AuthAwareService` using the given service and authorization context.
    pub fn new(service: FileService, context: AuthorizationContext) -> Self {
        Self { service, context }
    }

    /// Context-bound wrapper around [`FileService::create_bucket`].
    pub fn create_bucket(&self, id: &str, params: BucketParams) -> Result<Bucket> {
        self.service.create_bucket(&self.context, id, params)
    }

    /// Context-bound wrapper around [`FileService::list_buckets`].
    pub fn list_buckets(&self) -> Result<Vec<Bucket>> {
        self.service.list_buckets(&self.context)
    }

    /// Context-bound wrapper around [`FileService::get_bucket`].
    pub fn get_bucket(&self, id: &str) -> Result<Bucket> {
        self.service.get_bucket(&self.context, id)
    }

    /// Context-bound wrapper around [`FileService::update_bucket`].
    pub fn update_bucket(&self, id: &str, params: BucketParams) -> Result<Bucket> {
        self.service.update_bucket(&self.context, id, params)
    }

    /// Context-bound wrapper around [`FileService::delete_bucket`].
    pub async fn delete_bucket(&self, id: &str) -> Result<()> {
        self.service.delete_bucket(&self.context, id).await
    }

    /// Context-bound wrapper around [`FileService::create_file`].
    pub async fn create_file(&self, bucket_id: &str, new: NewFile) -> Result<File> {
        self.service.create_file(&self.context, bucket_id, new).await
    }

    /// Context-bound wrapper around [`FileService::list_files`].
    pub fn list_files(&self, bucket_id: &str) -> Result<Vec<File>> {
        self.service.list_files(&self.context, bucket_id)
    }

    /// Context-bound wrapper around [`FileService::get_file`].
    pub fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<File> {
        self.service.get_file(&self.context, bucket_id, file_id)
    }

    /// Context-bound wrapper around [`FileService::read_file`].
    pub async fn read_file(&self, bucket_id: &str, file_id: &str) -> Result<(File, Bytes)> {
        self.service
            .read_file(&self.context, bucket_id, file_id)
            .await
    }

    /// Context-bound wrapper around [`FileService::update_file`].
    pub fn update_file(&self, bucket_id: &str, file_id: &str, update: FileUpdate) -> Result<File> {
        self.service
            .update_file(&self.context, bucket_id, file_id, update)
    }

    /// Context-bound wrapper around [`FileService::delete_file`].
    pub async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()> {
        self.service
            .delete_file(&self.context, bucket_id, file_id)
            .await
    }
}
