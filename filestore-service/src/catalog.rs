//! The record store for buckets and files.
//!
//! All mutations take a closure that sees the current bucket state under the write lock. Checks
//! that depend on bucket configuration run inside that closure, so a concurrent bucket update
//! cannot slip between the check and the write.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use filestore_types::{Bucket, File};

use crate::backend::PayloadKey;
use crate::error::{Result, ServiceError};

#[derive(Debug)]
struct FileEntry {
    file: File,
    payload: PayloadKey,
}

#[derive(Debug)]
struct BucketEntry {
    bucket: Bucket,
    files: BTreeMap<String, FileEntry>,
}

/// A snapshot of a file together with the bucket it belongs to.
#[derive(Clone, Debug)]
pub(crate) struct FileRecord {
    pub bucket: Bucket,
    pub file: File,
    pub payload: PayloadKey,
}

#[derive(Debug, Default)]
pub(crate) struct Catalog {
    buckets: RwLock<BTreeMap<String, BucketEntry>>,
}

impl Catalog {
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, BucketEntry>> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, BucketEntry>> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_bucket(&self, bucket: Bucket) -> Result<Bucket> {
        let mut buckets = self.write();
        if buckets.contains_key(&bucket.id) {
            return Err(ServiceError::BucketExists(bucket.id));
        }

        let entry = BucketEntry {
            bucket: bucket.clone(),
            files: BTreeMap::new(),
        };
        buckets.insert(bucket.id.clone(), entry);
        Ok(bucket)
    }

    pub fn get_bucket(&self, id: &str) -> Result<Bucket> {
        self.read()
            .get(id)
            .map(|entry| entry.bucket.clone())
            .ok_or_else(|| ServiceError::BucketNotFound(id.to_owned()))
    }

    /// Returns all buckets in creation order.
    pub fn list_buckets(&self) -> Vec<Bucket> {
        let mut buckets: Vec<_> = self.read().values().map(|e| e.bucket.clone()).collect();
        buckets.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        buckets
    }

    /// Applies `update` to a copy of the bucket and stores it if the closure succeeds.
    pub fn update_bucket<F>(&self, id: &str, update: F) -> Result<Bucket>
    where
        F: FnOnce(&mut Bucket) -> Result<()>,
    {
        let mut buckets = self.write();
        let entry = buckets
            .get_mut(id)
            .ok_or_else(|| ServiceError::BucketNotFound(id.to_owned()))?;

        let mut bucket = entry.bucket.clone();
        update(&mut bucket)?;
        entry.bucket = bucket.clone();
        Ok(bucket)
    }

    /// Removes a bucket with all of its files, returning the payloads that are now orphaned.
    pub fn remove_bucket(&self, id: &str) -> Result<Vec<PayloadKey>> {
        let entry = self
            .write()
            .remove(id)
            .ok_or_else(|| ServiceError::BucketNotFound(id.to_owned()))?;

        Ok(entry.files.into_values().map(|f| f.payload).collect())
    }

    /// Commits a new file after `check` has accepted the current state of its bucket.
    pub fn insert_file<F>(&self, file: File, payload: PayloadKey, check: F) -> Result<File>
    where
        F: FnOnce(&Bucket) -> Result<()>,
    {
        let mut buckets = self.write();
        let entry = buckets
            .get_mut(&file.bucket_id)
            .ok_or_else(|| ServiceError::BucketNotFound(file.bucket_id.clone()))?;

        check(&entry.bucket)?;

        if entry.files.contains_key(&file.id) {
            return Err(ServiceError::FileExists(file.id));
        }

        let id = file.id.clone();
        entry.files.insert(
            id,
            FileEntry {
                file: file.clone(),
                payload,
            },
        );
        Ok(file)
    }

    pub fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<FileRecord> {
        let buckets = self.read();
        let entry = buckets
            .get(bucket_id)
            .ok_or_else(|| ServiceError::BucketNotFound(bucket_id.to_owned()))?;
        let file = entry
            .files
            .get(file_id)
            .ok_or_else(|| ServiceError::FileNotFound(file_id.to_owned()))?;

        Ok(FileRecord {
            bucket: entry.bucket.clone(),
            file: file.file.clone(),
            payload: file.payload.clone(),
        })
    }

    /// Returns a bucket and all of its files in creation order.
    pub fn list_files(&self, bucket_id: &str) -> Result<(Bucket, Vec<File>)> {
        let buckets = self.read();
        let entry = buckets
            .get(bucket_id)
            .ok_or_else(|| ServiceError::BucketNotFound(bucket_id.to_owned()))?;

        let mut files: Vec<_> = entry.files.values().map(|f| f.file.clone()).collect();
        files.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok((entry.bucket.clone(), files))
    }

    /// Applies `update` to a copy of the file and stores it if the closure succeeds.
    pub fn update_file<F>(&self, bucket_id: &str, file_id: &str, update: F) -> Result<File>
    where
        F: FnOnce(&Bucket, &mut File) -> Result<()>,
    {
        let mut buckets = self.write();
        let entry = buckets
            .get_mut(bucket_id)
            .ok_or_else(|| ServiceError::BucketNotFound(bucket_id.to_owned()))?;
        let file_entry = entry
            .files
            .get_mut(file_id)
            .ok_or_else(|| ServiceError::FileNotFound(file_id.to_owned()))?;

        let mut file = file_entry.file.clone();
        update(&entry.bucket, &mut file)?;
        file_entry.file = file.clone();
        Ok(file)
    }

    /// Removes a file after `check` has accepted it, returning its payload key.
    pub fn remove_file<F>(&self, bucket_id: &str, file_id: &str, check: F) -> Result<PayloadKey>
    where
        F: FnOnce(&Bucket, &File) -> Result<()>,
    {
        let mut buckets = self.write();
        let entry = buckets
            .get_mut(bucket_id)
            .ok_or_else(|| ServiceError::BucketNotFound(bucket_id.to_owned()))?;
        let file_entry = entry
            .files
            .get(file_id)
            .ok_or_else(|| ServiceError::FileNotFound(file_id.to_owned()))?;

        check(&entry.bucket, &file_entry.file)?;

        match entry.files.remove(file_id) {
            Some(removed) => Ok(removed.payload),
            None => Err(ServiceError::FileNotFound(file_id.to_owned())),
        }
    }
}
