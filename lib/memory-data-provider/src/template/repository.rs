use async_trait::async_trait;
use pki_core::model::template::CertificateTemplate;
use pki_core::repository::error::DataLayerError;
use pki_core::repository::template_repository::TemplateRepository;
use shared_types::{CertificateId, TemplateId};

use super::TemplateProvider;

#[async_trait]
impl TemplateRepository for TemplateProvider {
    async fn create(&self, request: CertificateTemplate) -> Result<TemplateId, DataLayerError> {
        let mut templates = self.templates.write().await;
        if templates.iter().any(|template| template.id == request.id) {
            return Err(DataLayerError::AlreadyExists);
        }

        let id = request.id;
        templates.push(request);
        Ok(id)
    }

    async fn get(&self, id: TemplateId) -> Result<Option<CertificateTemplate>, DataLayerError> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|template| template.id == id)
            .cloned())
    }

    async fn list(
        &self,
        issuer_id: Option<CertificateId>,
    ) -> Result<Vec<CertificateTemplate>, DataLayerError> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .filter(|template| issuer_id.is_none_or(|issuer_id| template.issuer_id == issuer_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: TemplateId) -> Result<(), DataLayerError> {
        let mut templates = self.templates.write().await;
        let before = templates.len();
        templates.retain(|template| template.id != id);

        if templates.len() == before {
            return Err(DataLayerError::RecordNotUpdated);
        }
        Ok(())
    }
}
