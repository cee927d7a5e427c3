use std::sync::Arc;

pub mod certificate_repository;
pub mod error;
pub mod revocation_repository;
pub mod template_repository;

use certificate_repository::CertificateRepository;
use revocation_repository::RevocationRepository;
use template_repository::TemplateRepository;

/// Entry point of a storage backend
pub trait DataRepository: Send + Sync {
    fn get_certificate_repository(&self) -> Arc<dyn CertificateRepository>;
    fn get_template_repository(&self) -> Arc<dyn TemplateRepository>;
    fn get_revocation_repository(&self) -> Arc<dyn RevocationRepository>;
}
