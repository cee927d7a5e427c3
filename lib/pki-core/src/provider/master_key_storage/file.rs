use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretSlice};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use zeroize::Zeroizing;

use super::{MasterKeyStorage, MasterKeyStorageError, validate_key_id};
use crate::model::master_key::MasterKey;

const KEYS_DIR: &str = "keys";
const CURRENT_POINTER: &str = "current";
const PENDING_POINTER: &str = "pending";
const KEY_LENGTH: usize = 32;

/// One file per master key under `<directory>/keys`, pointers as plain files
/// next to it. Key files are created with mode `0600` on unix.
pub struct FileMasterKeyStorage {
    directory: PathBuf,
}

impl FileMasterKeyStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn key_path(&self, id: &str) -> PathBuf {
        self.directory.join(KEYS_DIR).join(format!("{id}.key"))
    }

    async fn read_pointer(&self, name: &str) -> Result<Option<String>, MasterKeyStorageError> {
        match fs::read_to_string(self.directory.join(name)).await {
            Ok(content) => {
                let id = content.trim();
                if id.is_empty() {
                    return Ok(None);
                }
                validate_key_id(id)?;
                Ok(Some(id.to_owned()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_pointer(&self, name: &str, id: &str) -> Result<(), MasterKeyStorageError> {
        fs::create_dir_all(&self.directory).await?;

        let target = self.directory.join(name);
        let temporary = self.directory.join(format!("{name}.tmp"));
        write_file(&temporary, id.as_bytes()).await?;
        fs::rename(&temporary, &target).await?;
        Ok(())
    }
}

#[async_trait]
impl MasterKeyStorage for FileMasterKeyStorage {
    async fn load(&self, id: &str) -> Result<Option<MasterKey>, MasterKeyStorageError> {
        validate_key_id(id)?;

        let content = match fs::read(self.key_path(id)).await {
            Ok(content) => Zeroizing::new(content),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if content.len() != KEY_LENGTH {
            return Err(MasterKeyStorageError::InvalidKeyMaterial(id.to_owned()));
        }

        Ok(Some(MasterKey {
            id: id.to_owned(),
            key: SecretSlice::from(content.to_vec()),
        }))
    }

    async fn save(&self, key: &MasterKey) -> Result<(), MasterKeyStorageError> {
        validate_key_id(&key.id)?;
        fs::create_dir_all(self.directory.join(KEYS_DIR)).await?;

        let path = self.key_path(&key.id);
        let temporary = path.with_extension("key.tmp");
        write_file(&temporary, key.key.expose_secret()).await?;
        fs::rename(&temporary, &path).await?;

        tracing::debug!(master_key_id = %key.id, "master key persisted");
        Ok(())
    }

    async fn get_current_id(&self) -> Result<Option<String>, MasterKeyStorageError> {
        self.read_pointer(CURRENT_POINTER).await
    }

    async fn set_current_id(&self, id: &str) -> Result<(), MasterKeyStorageError> {
        validate_key_id(id)?;
        self.write_pointer(CURRENT_POINTER, id).await
    }

    async fn get_pending_id(&self) -> Result<Option<String>, MasterKeyStorageError> {
        self.read_pointer(PENDING_POINTER).await
    }

    async fn set_pending_id(&self, id: &str) -> Result<(), MasterKeyStorageError> {
        validate_key_id(id)?;
        self.write_pointer(PENDING_POINTER, id).await
    }

    async fn clear_pending_id(&self) -> Result<(), MasterKeyStorageError> {
        match fs::remove_file(self.directory.join(PENDING_POINTER)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

async fn write_file(path: &Path, content: &[u8]) -> Result<(), MasterKeyStorageError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    Ok(())
}
