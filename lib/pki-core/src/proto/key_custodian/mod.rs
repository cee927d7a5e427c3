//! Envelope encryption of custodied private keys under a rotatable master key

use std::collections::HashMap;
use std::sync::Arc;

use pki_crypto::encryption::EncryptionError;
use secrecy::SecretString;
use shared_types::CertificateId;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::model::certificate::Certificate;
use crate::model::master_key::MasterKey;
use crate::provider::master_key_storage::{MasterKeyStorage, MasterKeyStorageError};
use crate::repository::certificate_repository::CertificateRepository;
use crate::repository::error::DataLayerError;

mod custodian;

pub const MASTER_KEY_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum KeyCustodianError {
    #[error("Master key `{0}` unavailable")]
    MasterKeyUnavailable(String),
    #[error("No private key stored for `{0}`")]
    NoPrivateKeyStored(CertificateId),
    #[error("Private key of `{0}` could not be decrypted")]
    DecryptionFailed(CertificateId),
    #[error("Re-encryption of `{certificate_id}` failed: {reason}")]
    ReEncryptionFailed {
        certificate_id: CertificateId,
        reason: String,
    },
    #[error("Encryption error: `{0}`")]
    Encryption(#[from] EncryptionError),
    #[error(transparent)]
    Storage(#[from] MasterKeyStorageError),
    #[error(transparent)]
    Repository(#[from] DataLayerError),
}

impl ErrorCodeMixin for KeyCustodianError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MasterKeyUnavailable(_) => ErrorCode::BR_0050,
            Self::NoPrivateKeyStored(_) => ErrorCode::BR_0051,
            Self::DecryptionFailed(_) => ErrorCode::BR_0052,
            Self::ReEncryptionFailed { .. } => ErrorCode::BR_0053,
            Self::Encryption(_) => ErrorCode::BR_0055,
            Self::Storage(error) => error.error_code(),
            Self::Repository(error) => error.error_code(),
        }
    }
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait KeyCustodian: Send + Sync {
    /// Fresh key, not persisted
    fn generate_master_key(&self) -> MasterKey;

    /// Loads or bootstraps the current key on first use
    async fn get_current_master_key(&self) -> Result<Arc<MasterKey>, KeyCustodianError>;

    /// Seals `private_key` onto `certificate`, the caller persists the record
    fn store_private_key(
        &self,
        certificate: &mut Certificate,
        private_key: &SecretString,
        master_key: &MasterKey,
    ) -> Result<(), KeyCustodianError>;

    fn retrieve_private_key(
        &self,
        certificate: &Certificate,
        master_key: &MasterKey,
    ) -> Result<SecretString, KeyCustodianError>;

    /// Decrypts with the master key the blob was sealed under
    async fn retrieve_custodied_key(
        &self,
        certificate: &Certificate,
    ) -> Result<SecretString, KeyCustodianError>;

    async fn re_encrypt_private_key(
        &self,
        certificate: &Certificate,
        old_master_key: &MasterKey,
        new_master_key: &MasterKey,
    ) -> Result<(), KeyCustodianError>;

    /// Resumable: an interrupted rotation is picked up by the next call
    async fn rotate_master_key(&self) -> Result<Arc<MasterKey>, KeyCustodianError>;
}

pub struct KeyCustodianImpl {
    storage: Arc<dyn MasterKeyStorage>,
    certificate_repository: Arc<dyn CertificateRepository>,
    current: RwLock<Option<Arc<MasterKey>>>,
    keys: RwLock<HashMap<String, Arc<MasterKey>>>,
    initialization: Mutex<()>,
    rotation: Mutex<()>,
}

impl KeyCustodianImpl {
    pub fn new(
        storage: Arc<dyn MasterKeyStorage>,
        certificate_repository: Arc<dyn CertificateRepository>,
    ) -> Self {
        Self {
            storage,
            certificate_repository,
            current: RwLock::new(None),
            keys: RwLock::new(HashMap::new()),
            initialization: Mutex::new(()),
            rotation: Mutex::new(()),
        }
    }
}
