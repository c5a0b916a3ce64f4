//! Bucket and file records.
//!
//! These are the records persisted by the service and returned by the web API. Field names
//! serialize in camel case; system attributes carry a `$` prefix.

use std::collections::BTreeSet;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// A named, policy-configured container of files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Bucket ID.
    #[serde(rename = "$id")]
    pub id: String,

    /// Creation time.
    #[serde(rename = "$createdAt", with = "humantime_serde")]
    pub created_at: SystemTime,

    /// Time of the last update.
    #[serde(rename = "$updatedAt", with = "humantime_serde")]
    pub updated_at: SystemTime,

    /// Bucket-level grants.
    #[serde(rename = "$permissions")]
    pub permissions: Vec<Permission>,

    /// Whether file-level permissions are considered in addition to bucket-level ones.
    #[serde(default)]
    pub file_security: bool,

    /// Bucket name.
    pub name: String,

    /// Whether the bucket and its files can be accessed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum file size in bytes. `0` means the system default applies.
    #[serde(default)]
    pub maximum_file_size: u64,

    /// Lower-cased file extensions accepted by this bucket. Empty means all are accepted.
    #[serde(default)]
    pub allowed_file_extensions: BTreeSet<String>,

    /// Whether payloads are encrypted at rest.
    #[serde(default = "default_true")]
    pub encryption: bool,

    /// Whether payloads are scanned for viruses.
    #[serde(default = "default_true")]
    pub antivirus: bool,
}

impl Bucket {
    /// Creates a bucket with default settings and no permissions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            permissions: Vec::new(),
            file_security: false,
            name: name.into(),
            enabled: true,
            maximum_file_size: 0,
            allowed_file_extensions: BTreeSet::new(),
            encryption: true,
            antivirus: true,
        }
    }
}

/// A stored object owned by exactly one bucket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// File ID, unique within its bucket.
    #[serde(rename = "$id")]
    pub id: String,

    /// ID of the owning bucket. Never changes.
    pub bucket_id: String,

    /// Creation time.
    #[serde(rename = "$createdAt", with = "humantime_serde")]
    pub created_at: SystemTime,

    /// Time of the last update.
    #[serde(rename = "$updatedAt", with = "humantime_serde")]
    pub updated_at: SystemTime,

    /// File-level grants, only considered if the bucket has file security enabled.
    #[serde(rename = "$permissions")]
    pub permissions: Vec<Permission>,

    /// File name, including its extension.
    pub name: String,

    /// MIME type of the payload.
    pub mime_type: String,

    /// Size of the original payload in bytes.
    pub size_original: u64,
}

impl File {
    /// Returns the lower-cased extension of the file name, or an empty string if there is none.
    ///
    /// ```
    /// use filestore_types::File;
    ///
    /// assert_eq!(File::extension_of("Logo.PNG"), "png");
    /// assert_eq!(File::extension_of("archive.tar.gz"), "gz");
    /// assert_eq!(File::extension_of("README"), "");
    /// ```
    pub fn extension_of(name: &str) -> String {
        match name.rsplit_once('.') {
            Some((_, extension)) => extension.to_lowercase(),
            None => String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
