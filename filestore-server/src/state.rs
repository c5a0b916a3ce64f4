use std::sync::Arc;

use anyhow::Context;
use filestore_service::policy::PolicyGate;
use filestore_service::{FileService, StorageConfig};

use crate::auth::PublicKeyDirectory;
use crate::config::{Config, Storage};

/// Shared reference to the filestore [services](Services).
pub type ServiceState = Arc<Services>;

/// Reference to the filestore business logic.
///
/// This structure is created during server startup and shared with all HTTP request handlers. It
/// can be used to access the file service and the keys used to verify session tokens.
///
/// In request handlers, use `axum::extract::State<ServiceState>` to retrieve a shared reference to
/// this structure.
#[derive(Debug)]
pub struct Services {
    /// The server configuration.
    pub config: Config,
    /// The file service instance.
    pub service: FileService,
    /// Public keys verifying session tokens, by key ID.
    pub key_directory: PublicKeyDirectory,
}

impl Services {
    /// Spawns all services for filestore.
    pub async fn spawn(config: Config) -> anyhow::Result<ServiceState> {
        let key_directory =
            PublicKeyDirectory::try_from(&config.auth).context("failed to load session keys")?;

        let gate = PolicyGate::new(config.limits.max_file_size)
            .with_upload_limit(config.limits.max_request_size as u64);
        let service = FileService::new(map_storage_config(&config.storage), gate).await?;

        Ok(Arc::new(Self {
            config,
            service,
            key_directory,
        }))
    }
}

fn map_storage_config(config: &'_ Storage) -> StorageConfig<'_> {
    match config {
        Storage::Memory => StorageConfig::Memory,
        Storage::FileSystem { path } => StorageConfig::FileSystem { path },
    }
}
