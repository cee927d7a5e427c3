use async_trait::async_trait;
use shared_types::{CertificateId, UserId};

use crate::model::certificate::{
    Certificate, CertificateListQuery, CertificateType, GetCertificateList,
    UpdateCertificateRequest,
};
use crate::repository::error::DataLayerError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Fails with [`DataLayerError::AlreadyExists`] on a duplicate id or serial number
    async fn create(&self, request: Certificate) -> Result<CertificateId, DataLayerError>;

    async fn get(&self, id: CertificateId) -> Result<Option<Certificate>, DataLayerError>;

    async fn get_by_serial(
        &self,
        serial_number: &str,
    ) -> Result<Option<Certificate>, DataLayerError>;

    async fn get_by_type(
        &self,
        certificate_type: CertificateType,
    ) -> Result<Vec<Certificate>, DataLayerError>;

    async fn get_by_issuer(
        &self,
        issuer_id: CertificateId,
    ) -> Result<Vec<Certificate>, DataLayerError>;

    async fn list_by_organization(
        &self,
        organization: &str,
    ) -> Result<Vec<Certificate>, DataLayerError>;

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Certificate>, DataLayerError>;

    async fn list_with_private_key(&self) -> Result<Vec<Certificate>, DataLayerError>;

    async fn update(
        &self,
        id: &CertificateId,
        request: UpdateCertificateRequest,
    ) -> Result<(), DataLayerError>;

    async fn search(
        &self,
        query: CertificateListQuery,
    ) -> Result<GetCertificateList, DataLayerError>;
}
