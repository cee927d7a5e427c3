use std::sync::Arc;

use crate::proto::clock::Clock;
use crate::provider::audit::AuditSink;
use crate::repository::certificate_repository::CertificateRepository;
use crate::repository::template_repository::TemplateRepository;

pub mod dto;
pub mod service;

#[derive(Clone)]
pub struct TemplateService {
    template_repository: Arc<dyn TemplateRepository>,
    certificate_repository: Arc<dyn CertificateRepository>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl TemplateService {
    pub fn new(
        template_repository: Arc<dyn TemplateRepository>,
        certificate_repository: Arc<dyn CertificateRepository>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            template_repository,
            certificate_repository,
            audit,
            clock,
        }
    }
}
