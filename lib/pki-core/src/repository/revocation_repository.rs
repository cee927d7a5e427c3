use async_trait::async_trait;
use shared_types::{CertificateId, RevocationId};

use crate::model::revocation::RevokedCertificate;
use crate::repository::error::DataLayerError;

/// Append-only store, records are never updated or removed
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RevocationRepository: Send + Sync {
    async fn create(&self, request: RevokedCertificate) -> Result<RevocationId, DataLayerError>;

    async fn get_by_certificate(
        &self,
        certificate_id: CertificateId,
    ) -> Result<Option<RevokedCertificate>, DataLayerError>;

    async fn list(&self) -> Result<Vec<RevokedCertificate>, DataLayerError>;
}
