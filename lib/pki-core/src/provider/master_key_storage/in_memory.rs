use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretSlice};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use super::{MasterKeyStorage, MasterKeyStorageError, validate_key_id};
use crate::model::master_key::MasterKey;

#[derive(Default)]
struct State {
    keys: HashMap<String, Zeroizing<Vec<u8>>>,
    current: Option<String>,
    pending: Option<String>,
}

/// Process-local storage, keys are lost on restart
#[derive(Default)]
pub struct InMemoryMasterKeyStorage {
    state: Mutex<State>,
}

impl InMemoryMasterKeyStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MasterKeyStorage for InMemoryMasterKeyStorage {
    async fn load(&self, id: &str) -> Result<Option<MasterKey>, MasterKeyStorageError> {
        let state = self.state.lock().await;
        Ok(state.keys.get(id).map(|key| MasterKey {
            id: id.to_owned(),
            key: SecretSlice::from(key.to_vec()),
        }))
    }

    async fn save(&self, key: &MasterKey) -> Result<(), MasterKeyStorageError> {
        validate_key_id(&key.id)?;
        let mut state = self.state.lock().await;
        state.keys.insert(
            key.id.to_owned(),
            Zeroizing::new(key.key.expose_secret().to_vec()),
        );
        Ok(())
    }

    async fn get_current_id(&self) -> Result<Option<String>, MasterKeyStorageError> {
        Ok(self.state.lock().await.current.clone())
    }

    async fn set_current_id(&self, id: &str) -> Result<(), MasterKeyStorageError> {
        validate_key_id(id)?;
        self.state.lock().await.current = Some(id.to_owned());
        Ok(())
    }

    async fn get_pending_id(&self) -> Result<Option<String>, MasterKeyStorageError> {
        Ok(self.state.lock().await.pending.clone())
    }

    async fn set_pending_id(&self, id: &str) -> Result<(), MasterKeyStorageError> {
        validate_key_id(id)?;
        self.state.lock().await.pending = Some(id.to_owned());
        Ok(())
    }

    async fn clear_pending_id(&self) -> Result<(), MasterKeyStorageError> {
        self.state.lock().await.pending = None;
        Ok(())
    }
}
