//! Storage backends for file payloads.
//!
//! Records live in the [catalog](crate::catalog); backends only ever see opaque payloads keyed by
//! [`PayloadKey`].

use std::fmt;
use std::fmt::Debug;

use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

mod in_memory;
mod local_fs;

pub(crate) use in_memory::InMemoryBackend;
pub(crate) use local_fs::LocalFs;

/// A type-erased [`Backend`] instance.
pub type BoxedBackend = Box<dyn Backend>;

/// The location of one stored payload.
///
/// Every upload gets a fresh key, so a payload written for a file that ends up never being
/// committed cannot clobber the payload of an existing file with the same ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PayloadKey {
    /// The owning bucket.
    pub bucket_id: String,
    /// The owning file.
    pub file_id: String,
    /// A unique ID for this upload.
    pub upload_id: Uuid,
}

impl PayloadKey {
    /// Creates a fresh key for a new upload of `file_id` into `bucket_id`.
    pub fn new(bucket_id: &str, file_id: &str) -> Self {
        Self {
            bucket_id: bucket_id.to_owned(),
            file_id: file_id.to_owned(),
            upload_id: Uuid::new_v4(),
        }
    }

    /// Returns a relative, slash-separated path for this key.
    pub fn as_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PayloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.bucket_id,
            self.file_id,
            self.upload_id.simple()
        )
    }
}

/// A store for file payloads.
#[async_trait::async_trait]
pub trait Backend: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Stores a payload under the given key, replacing any previous payload.
    async fn put_payload(&self, key: &PayloadKey, payload: Bytes) -> BackendResult<()>;

    /// Retrieves the payload stored under the given key.
    async fn get_payload(&self, key: &PayloadKey) -> BackendResult<Option<Bytes>>;

    /// Deletes the payload stored under the given key. Deleting a missing payload succeeds.
    async fn delete_payload(&self, key: &PayloadKey) -> BackendResult<()>;
}

/// Errors returned by a [`Backend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// IO errors related to file operations.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
