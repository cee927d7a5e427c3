use std::sync::Arc;

use pki_crypto::encryption::{decrypt_string, encrypt_string};
use pki_crypto::utilities::generate_random_bytes;
use secrecy::{SecretSlice, SecretString};

use super::{KeyCustodian, KeyCustodianError, KeyCustodianImpl, MASTER_KEY_LENGTH};
use crate::model::certificate::{Certificate, EncryptedPrivateKey, UpdateCertificateRequest};
use crate::model::master_key::MasterKey;

#[async_trait::async_trait]
impl KeyCustodian for KeyCustodianImpl {
    fn generate_master_key(&self) -> MasterKey {
        MasterKey {
            id: format!("mk-{}", uuid::Uuid::new_v4()),
            key: SecretSlice::from(generate_random_bytes::<MASTER_KEY_LENGTH>().to_vec()),
        }
    }

    async fn get_current_master_key(&self) -> Result<Arc<MasterKey>, KeyCustodianError> {
        if let Some(current) = self.current.read().await.as_ref() {
            return Ok(current.clone());
        }

        let _guard = self.initialization.lock().await;
        if let Some(current) = self.current.read().await.as_ref() {
            return Ok(current.clone());
        }

        let key = match self.storage.get_current_id().await? {
            Some(id) => self.load_master_key(&id).await?,
            None => {
                let key = Arc::new(self.generate_master_key());
                self.storage.save(&key).await?;
                self.storage.set_current_id(&key.id).await?;
                self.keys
                    .write()
                    .await
                    .insert(key.id.to_owned(), key.clone());
                tracing::info!(master_key_id = %key.id, "generated initial master key");
                key
            }
        };

        *self.current.write().await = Some(key.clone());
        Ok(key)
    }

    fn store_private_key(
        &self,
        certificate: &mut Certificate,
        private_key: &SecretString,
        master_key: &MasterKey,
    ) -> Result<(), KeyCustodianError> {
        let ciphertext = encrypt_string(private_key, &master_key.key)?;
        certificate.private_key = Some(EncryptedPrivateKey {
            master_key_id: master_key.id.to_owned(),
            ciphertext,
        });
        Ok(())
    }

    fn retrieve_private_key(
        &self,
        certificate: &Certificate,
        master_key: &MasterKey,
    ) -> Result<SecretString, KeyCustodianError> {
        let blob = certificate
            .private_key
            .as_ref()
            .ok_or(KeyCustodianError::NoPrivateKeyStored(certificate.id))?;

        decrypt_string(&blob.ciphertext, &master_key.key).map_err(|err| {
            tracing::warn!(
                certificate_id = %certificate.id,
                master_key_id = %master_key.id,
                "private key decryption failed: {err}"
            );
            KeyCustodianError::DecryptionFailed(certificate.id)
        })
    }

    async fn retrieve_custodied_key(
        &self,
        certificate: &Certificate,
    ) -> Result<SecretString, KeyCustodianError> {
        let blob = certificate
            .private_key
            .as_ref()
            .ok_or(KeyCustodianError::NoPrivateKeyStored(certificate.id))?;

        let master_key = self.load_master_key(&blob.master_key_id).await?;
        self.retrieve_private_key(certificate, &master_key)
    }

    async fn re_encrypt_private_key(
        &self,
        certificate: &Certificate,
        old_master_key: &MasterKey,
        new_master_key: &MasterKey,
    ) -> Result<(), KeyCustodianError> {
        let private_key = self.retrieve_private_key(certificate, old_master_key)?;

        let mut updated = certificate.to_owned();
        self.store_private_key(&mut updated, &private_key, new_master_key)?;

        self.certificate_repository
            .update(
                &certificate.id,
                UpdateCertificateRequest {
                    private_key: updated.private_key,
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn rotate_master_key(&self) -> Result<Arc<MasterKey>, KeyCustodianError> {
        let _guard = self.rotation.lock().await;
        let current = self.get_current_master_key().await?;

        let new_key = match self.storage.get_pending_id().await? {
            Some(pending_id) => {
                tracing::info!(master_key_id = %pending_id, "resuming master key rotation");
                self.load_master_key(&pending_id).await?
            }
            None => {
                let key = Arc::new(self.generate_master_key());
                self.storage.save(&key).await?;
                self.storage.set_pending_id(&key.id).await?;
                self.keys
                    .write()
                    .await
                    .insert(key.id.to_owned(), key.clone());
                key
            }
        };

        let certificates = self.certificate_repository.list_with_private_key().await?;
        let mut re_encrypted = 0usize;
        for certificate in &certificates {
            let Some(blob) = &certificate.private_key else {
                continue;
            };
            if blob.master_key_id == new_key.id {
                continue;
            }

            let result = match self.load_master_key(&blob.master_key_id).await {
                Ok(old_key) => {
                    self.re_encrypt_private_key(certificate, &old_key, &new_key)
                        .await
                }
                Err(err) => Err(err),
            };

            if let Err(err) = result {
                tracing::error!(
                    certificate_id = %certificate.id,
                    master_key_id = %new_key.id,
                    "master key rotation aborted: {err}"
                );
                return Err(KeyCustodianError::ReEncryptionFailed {
                    certificate_id: certificate.id,
                    reason: err.to_string(),
                });
            }
            re_encrypted += 1;
        }

        self.storage.set_current_id(&new_key.id).await?;
        self.storage.clear_pending_id().await?;
        *self.current.write().await = Some(new_key.clone());

        tracing::info!(
            previous = %current.id,
            current = %new_key.id,
            re_encrypted,
            "master key rotated"
        );
        Ok(new_key)
    }
}

impl KeyCustodianImpl {
    async fn load_master_key(&self, id: &str) -> Result<Arc<MasterKey>, KeyCustodianError> {
        if let Some(key) = self.keys.read().await.get(id) {
            return Ok(key.clone());
        }

        let key = self
            .storage
            .load(id)
            .await?
            .ok_or_else(|| KeyCustodianError::MasterKeyUnavailable(id.to_owned()))?;

        let key = Arc::new(key);
        self.keys
            .write()
            .await
            .insert(id.to_owned(), key.clone());
        Ok(key)
    }
}
