use async_trait::async_trait;
use shared_types::{CertificateId, TemplateId};

use crate::model::template::CertificateTemplate;
use crate::repository::error::DataLayerError;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create(&self, request: CertificateTemplate) -> Result<TemplateId, DataLayerError>;

    async fn get(&self, id: TemplateId) -> Result<Option<CertificateTemplate>, DataLayerError>;

    async fn list(
        &self,
        issuer_id: Option<CertificateId>,
    ) -> Result<Vec<CertificateTemplate>, DataLayerError>;

    async fn delete(&self, id: TemplateId) -> Result<(), DataLayerError>;
}
