//! Durable storage of master keys and of the current / pending key pointers

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::model::master_key::MasterKey;

pub mod file;
pub mod in_memory;

#[derive(Debug, Error)]
pub enum MasterKeyStorageError {
    #[error("IO error: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Invalid master key id `{0}`")]
    InvalidKeyId(String),
    #[error("Invalid master key material for `{0}`")]
    InvalidKeyMaterial(String),
}

impl ErrorCodeMixin for MasterKeyStorageError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::BR_0054
    }
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait MasterKeyStorage: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<MasterKey>, MasterKeyStorageError>;

    async fn save(&self, key: &MasterKey) -> Result<(), MasterKeyStorageError>;

    async fn get_current_id(&self) -> Result<Option<String>, MasterKeyStorageError>;

    async fn set_current_id(&self, id: &str) -> Result<(), MasterKeyStorageError>;

    /// Key of a rotation that has started but not completed
    async fn get_pending_id(&self) -> Result<Option<String>, MasterKeyStorageError>;

    async fn set_pending_id(&self, id: &str) -> Result<(), MasterKeyStorageError>;

    async fn clear_pending_id(&self) -> Result<(), MasterKeyStorageError>;
}

pub(crate) fn validate_key_id(id: &str) -> Result<(), MasterKeyStorageError> {
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MasterKeyStorageError::InvalidKeyId(id.to_owned()));
    }
    Ok(())
}
