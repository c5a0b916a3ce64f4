use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::{Backend, BackendResult, PayloadKey};

#[derive(Debug)]
pub(crate) struct LocalFs {
    path: PathBuf,
}

impl LocalFs {
    pub fn new(path: &Path) -> Self {
        Self { path: path.into() }
    }

    fn payload_path(&self, key: &PayloadKey) -> PathBuf {
        self.path.join(key.as_path())
    }
}

#[async_trait::async_trait]
impl Backend for LocalFs {
    fn name(&self) -> &'static str {
        "local-fs"
    }

    async fn put_payload(&self, key: &PayloadKey, payload: Bytes) -> BackendResult<()> {
        let path = self.payload_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;

        let mut writer = BufWriter::new(file);
        writer.write_all(&payload).await?;
        writer.flush().await?;
        let file = writer.into_inner();
        file.sync_data().await?;

        Ok(())
    }

    async fn get_payload(&self, key: &PayloadKey) -> BackendResult<Option<Bytes>> {
        match tokio::fs::read(self.payload_path(key)).await {
            Ok(contents) => Ok(Some(contents.into())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_payload(&self, key: &PayloadKey) -> BackendResult<()> {
        match tokio::fs::remove_file(self.payload_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_payload_lifecycle() {
        let tempdir = tempfile::tempdir().unwrap();
        let backend = LocalFs::new(tempdir.path());
        let key = PayloadKey::new("photos", "logo.png");

        assert_eq!(backend.get_payload(&key).await.unwrap(), None);

        backend
            .put_payload(&key, Bytes::from_static(b"first"))
            .await
            .unwrap();
        backend
            .put_payload(&key, Bytes::from_static(b"second"))
            .await
            .unwrap();
        assert_eq!(
            backend.get_payload(&key).await.unwrap(),
            Some(Bytes::from_static(b"second"))
        );
        assert!(tempdir.path().join(key.as_path()).exists());

        backend.delete_payload(&key).await.unwrap();
        assert_eq!(backend.get_payload(&key).await.unwrap(), None);
        // Deleting twice is fine
        backend.delete_payload(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_do_not_collide() {
        let tempdir = tempfile::tempdir().unwrap();
        let backend = LocalFs::new(tempdir.path());
        let first = PayloadKey::new("b1", "f1");
        let second = PayloadKey::new("b1", "f1");
        assert_ne!(first, second);

        backend.put_payload(&first, Bytes::from_static(b"a")).await.unwrap();
        backend.put_payload(&second, Bytes::from_static(b"b")).await.unwrap();
        backend.delete_payload(&second).await.unwrap();

        assert_eq!(
            backend.get_payload(&first).await.unwrap(),
            Some(Bytes::from_static(b"a"))
        );
    }
}
