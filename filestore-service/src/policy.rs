//! Non-permission bucket policy: the enabled flag, file size limits and allowed extensions.

use filestore_types::{Bucket, File};

/// A bucket policy rejected an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The bucket is disabled.
    #[error("bucket `{0}` is disabled")]
    BucketDisabled(String),
    /// The upload exceeds the applicable size limit.
    #[error("file size of {size} bytes exceeds the maximum of {limit} bytes")]
    FileTooLarge {
        /// The size of the upload.
        size: u64,
        /// The limit that applies.
        limit: u64,
    },
    /// The bucket does not accept the file's extension.
    #[error("file extension `{0}` is not allowed")]
    ExtensionNotAllowed(String),
    /// A bucket's size limit exceeds the largest upload the system accepts.
    #[error("maximum file size of {requested} bytes exceeds the upload limit of {limit} bytes")]
    BucketLimitTooLarge {
        /// The requested bucket limit.
        requested: u64,
        /// The largest upload the system accepts.
        limit: u64,
    },
}

/// The properties of an incoming upload that are subject to bucket policy.
#[derive(Clone, Copy, Debug)]
pub struct Upload<'a> {
    /// The file name, including its extension.
    pub name: &'a str,
    /// The payload size in bytes.
    pub size: u64,
}

/// Enforces bucket policy independently of permissions.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyGate {
    system_max_file_size: u64,
    max_upload_size: u64,
}

impl PolicyGate {
    /// Creates a gate applying `system_max_file_size` to buckets without their own limit.
    ///
    /// A value of `0` means that such buckets have no limit.
    pub fn new(system_max_file_size: u64) -> Self {
        Self {
            system_max_file_size,
            max_upload_size: 0,
        }
    }

    /// Sets the largest upload the system accepts at all, `0` for none.
    ///
    /// Buckets cannot be configured with a size limit above it.
    pub fn with_upload_limit(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Checks a bucket's `maximum_file_size` setting against the upload limit.
    pub fn check_bucket_limit(&self, maximum_file_size: u64) -> Result<(), PolicyError> {
        if self.max_upload_size != 0 && maximum_file_size > self.max_upload_size {
            return Err(PolicyError::BucketLimitTooLarge {
                requested: maximum_file_size,
                limit: self.max_upload_size,
            });
        }
        Ok(())
    }

    /// Returns the size limit that applies to uploads into `bucket`, if any.
    pub fn max_file_size(&self, bucket: &Bucket) -> Option<u64> {
        match bucket.maximum_file_size {
            0 if self.system_max_file_size == 0 => None,
            0 => Some(self.system_max_file_size),
            limit => Some(limit),
        }
    }

    /// Rejects any operation on a disabled bucket.
    pub fn ensure_enabled(&self, bucket: &Bucket) -> Result<(), PolicyError> {
        if bucket.enabled {
            Ok(())
        } else {
            Err(PolicyError::BucketDisabled(bucket.id.clone()))
        }
    }

    /// Checks an upload against all policies of `bucket`.
    pub fn check_upload(&self, bucket: &Bucket, upload: &Upload<'_>) -> Result<(), PolicyError> {
        self.ensure_enabled(bucket)?;

        match self.max_file_size(bucket) {
            Some(limit) if upload.size > limit => {
                return Err(PolicyError::FileTooLarge {
                    size: upload.size,
                    limit,
                });
            }
            _ => (),
        }

        if !bucket.allowed_file_extensions.is_empty() {
            let extension = File::extension_of(upload.name);
            if !bucket.allowed_file_extensions.contains(&extension) {
                return Err(PolicyError::ExtensionNotAllowed(extension));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn upload(name: &str, size: u64) -> Upload<'_> {
        Upload { name, size }
    }

    #[test]
    fn test_disabled_bucket() {
        let mut bucket = Bucket::new("b1", "Bucket");
        bucket.enabled = false;

        let gate = PolicyGate::new(0);
        assert_eq!(
            gate.ensure_enabled(&bucket),
            Err(PolicyError::BucketDisabled("b1".into()))
        );
        assert_eq!(
            gate.check_upload(&bucket, &upload("a.txt", 1)),
            Err(PolicyError::BucketDisabled("b1".into()))
        );
    }

    #[test]
    fn test_size_limits() {
        let mut bucket = Bucket::new("b1", "Bucket");

        let gate = PolicyGate::new(0);
        assert_eq!(gate.max_file_size(&bucket), None);
        assert!(gate.check_upload(&bucket, &upload("a", u64::MAX)).is_ok());

        let gate = PolicyGate::new(100);
        assert_eq!(gate.max_file_size(&bucket), Some(100));
        assert!(gate.check_upload(&bucket, &upload("a", 100)).is_ok());
        assert_eq!(
            gate.check_upload(&bucket, &upload("a", 101)),
            Err(PolicyError::FileTooLarge {
                size: 101,
                limit: 100
            })
        );

        bucket.maximum_file_size = 1000;
        assert_eq!(gate.max_file_size(&bucket), Some(1000));
        assert!(gate.check_upload(&bucket, &upload("a", 1000)).is_ok());
    }

    #[test]
    fn test_bucket_limit() {
        let gate = PolicyGate::new(100);
        assert!(gate.check_bucket_limit(u64::MAX).is_ok());

        let gate = gate.with_upload_limit(1024);
        assert!(gate.check_bucket_limit(0).is_ok());
        assert!(gate.check_bucket_limit(1024).is_ok());
        assert_eq!(
            gate.check_bucket_limit(1025),
            Err(PolicyError::BucketLimitTooLarge {
                requested: 1025,
                limit: 1024
            })
        );
    }

    #[test]
    fn test_allowed_extensions() {
        let mut bucket = Bucket::new("b1", "Bucket");
        let gate = PolicyGate::new(0);
        assert!(gate.check_upload(&bucket, &upload("noext", 1)).is_ok());

        bucket.allowed_file_extensions = BTreeSet::from(["png".to_owned(), "jpg".to_owned()]);
        assert!(gate.check_upload(&bucket, &upload("logo.PNG", 1)).is_ok());
        assert!(gate.check_upload(&bucket, &upload("photo.jpg", 1)).is_ok());
        assert_eq!(
            gate.check_upload(&bucket, &upload("doc.pdf", 1)),
            Err(PolicyError::ExtensionNotAllowed("pdf".into()))
        );
        assert_eq!(
            gate.check_upload(&bucket, &upload("noext", 1)),
            Err(PolicyError::ExtensionNotAllowed(String::new()))
        );
    }

    #[test]
    fn test_disabled_checked_first() {
        let mut bucket = Bucket::new("b1", "Bucket");
        bucket.enabled = false;
        bucket.maximum_file_size = 1;
        bucket.allowed_file_extensions = BTreeSet::from(["png".to_owned()]);

        let err = PolicyGate::new(0)
            .check_upload(&bucket, &upload("doc.pdf", 10))
            .unwrap_err();
        assert_eq!(err, PolicyError::BucketDisabled("b1".into()));
    }
}
