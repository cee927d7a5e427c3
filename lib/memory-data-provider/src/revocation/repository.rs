use async_trait::async_trait;
use pki_core::model::revocation::RevokedCertificate;
use pki_core::repository::error::DataLayerError;
use pki_core::repository::revocation_repository::RevocationRepository;
use shared_types::{CertificateId, RevocationId};

use super::RevocationProvider;

#[async_trait]
impl RevocationRepository for RevocationProvider {
    async fn create(&self, request: RevokedCertificate) -> Result<RevocationId, DataLayerError> {
        let mut revocations = self.revocations.write().await;
        if revocations.iter().any(|revocation| {
            revocation.id == request.id || revocation.certificate_id == request.certificate_id
        }) {
            return Err(DataLayerError::AlreadyExists);
        }

        let id = request.id;
        revocations.push(request);
        Ok(id)
    }

    async fn get_by_certificate(
        &self,
        certificate_id: CertificateId,
    ) -> Result<Option<RevokedCertificate>, DataLayerError> {
        Ok(self
            .revocations
            .read()
            .await
            .iter()
            .find(|revocation| revocation.certificate_id == certificate_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<RevokedCertificate>, DataLayerError> {
        Ok(self.revocations.read().await.clone())
    }
}
