use shared_types::UserId;

use super::MasterKeyService;
use crate::provider::audit::SYSTEM_ACTOR;
use crate::service::error::ServiceError;

impl MasterKeyService {
    /// Id of the key new private keys are sealed under
    pub async fn get_current_master_key_id(&self) -> Result<String, ServiceError> {
        Ok(self.key_custodian.get_current_master_key().await?.id.clone())
    }

    /// Re-encrypts every custodied key under a new master key and promotes it,
    /// returns the id of the new current key
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn rotate_master_key(&self, actor: Option<UserId>) -> Result<String, ServiceError> {
        let actor = actor.map_or_else(|| SYSTEM_ACTOR.to_string(), |actor| actor.to_string());

        let result = self.key_custodian.rotate_master_key().await;
        match &result {
            Ok(key) => self
                .audit
                .log(&format!("ROTATE_MASTER_KEY {}", key.id), &actor),
            Err(err) => self
                .audit
                .log(&format!("ROTATE_MASTER_KEY_FAILED {err}"), &actor),
        }

        Ok(result?.id.clone())
    }
}
