use shared_types::{CertificateId, TemplateId};

use super::TemplateService;
use super::dto::CreateTemplateRequestDTO;
use crate::model::template::CertificateTemplate;
use crate::proto::chain_validator::ChainValidationError;
use crate::proto::template_policy::compile_pattern;
use crate::provider::audit::SYSTEM_ACTOR;
use crate::service::error::{EntityNotFoundError, ServiceError, ValidationError};

impl TemplateService {
    /// Binds a policy to a CA, patterns must compile
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn create_template(
        &self,
        request: CreateTemplateRequestDTO,
    ) -> Result<TemplateId, ServiceError> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::InvalidRequest("empty template name".to_string()).into());
        }
        if request.max_ttl_days == Some(0) {
            return Err(ValidationError::InvalidTtl.into());
        }
        for pattern in [&request.cn_regex, &request.san_regex].into_iter().flatten() {
            compile_pattern(pattern)?;
        }

        let issuer = self
            .certificate_repository
            .get(request.issuer_id)
            .await?
            .ok_or(ChainValidationError::IssuerNotFound(request.issuer_id))?;
        if !issuer.is_ca() {
            return Err(ChainValidationError::IssuerNotCA(issuer.id).into());
        }

        let now = self.clock.now_utc();
        let template = CertificateTemplate {
            id: TemplateId::new_v4(),
            created_date: now,
            last_modified: now,
            name: request.name,
            issuer_id: request.issuer_id,
            cn_regex: request.cn_regex,
            san_regex: request.san_regex,
            max_ttl_days: request.max_ttl_days,
            key_usage: request.key_usage,
            extended_key_usage: request.extended_key_usage,
            owner_id: request.owner_id,
        };

        let id = self.template_repository.create(template).await?;
        self.audit.log(
            &format!("CREATE_TEMPLATE {id}"),
            &request
                .owner_id
                .map_or_else(|| SYSTEM_ACTOR.to_string(), |owner| owner.to_string()),
        );
        Ok(id)
    }

    pub async fn get_template(&self, id: TemplateId) -> Result<CertificateTemplate, ServiceError> {
        self.template_repository
            .get(id)
            .await?
            .ok_or_else(|| EntityNotFoundError::Template(id).into())
    }

    /// All templates, or only those bound to `issuer_id`
    pub async fn list_templates(
        &self,
        issuer_id: Option<CertificateId>,
    ) -> Result<Vec<CertificateTemplate>, ServiceError> {
        Ok(self.template_repository.list(issuer_id).await?)
    }

    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn delete_template(&self, id: TemplateId) -> Result<(), ServiceError> {
        let template = self.get_template(id).await?;
        self.template_repository.delete(id).await?;

        self.audit.log(
            &format!("DELETE_TEMPLATE {id}"),
            &template
                .owner_id
                .map_or_else(|| SYSTEM_ACTOR.to_string(), |owner| owner.to_string()),
        );
        Ok(())
    }
}
