use std::sync::Arc;

use crate::config::core_config::CoreConfig;
use crate::proto::chain_validator::ChainValidator;
use crate::proto::clock::Clock;
use crate::proto::csr_verifier::CsrVerifier;
use crate::proto::key_custodian::KeyCustodian;
use crate::proto::template_policy::TemplatePolicy;
use crate::provider::audit::AuditSink;
use crate::repository::certificate_repository::CertificateRepository;
use crate::repository::template_repository::TemplateRepository;

pub mod dto;
mod issuance;
mod mapper;
pub mod service;

#[derive(Clone)]
pub struct CertificateService {
    certificate_repository: Arc<dyn CertificateRepository>,
    template_repository: Arc<dyn TemplateRepository>,
    chain_validator: Arc<dyn ChainValidator>,
    key_custodian: Arc<dyn KeyCustodian>,
    csr_verifier: Arc<dyn CsrVerifier>,
    template_policy: Arc<dyn TemplatePolicy>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    config: Arc<CoreConfig>,
}

impl CertificateService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        certificate_repository: Arc<dyn CertificateRepository>,
        template_repository: Arc<dyn TemplateRepository>,
        chain_validator: Arc<dyn ChainValidator>,
        key_custodian: Arc<dyn KeyCustodian>,
        csr_verifier: Arc<dyn CsrVerifier>,
        template_policy: Arc<dyn TemplatePolicy>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        config: Arc<CoreConfig>,
    ) -> Self {
        Self {
            certificate_repository,
            template_repository,
            chain_validator,
            key_custodian,
            csr_verifier,
            template_policy,
            audit,
            clock,
            config,
        }
    }
}
