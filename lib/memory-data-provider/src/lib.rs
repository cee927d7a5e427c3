#![cfg_attr(feature = "strict", deny(warnings))]

use std::sync::Arc;

use certificate::CertificateProvider;
use pki_core::proto::clock::{Clock, DefaultClock};
use pki_core::repository::DataRepository;
use pki_core::repository::certificate_repository::CertificateRepository;
use pki_core::repository::revocation_repository::RevocationRepository;
use pki_core::repository::template_repository::TemplateRepository;
use revocation::RevocationProvider;
use template::TemplateProvider;

mod common;

pub mod certificate;
pub mod revocation;
pub mod template;

/// Process-local storage backend, contents are lost on drop
#[derive(Clone)]
pub struct DataLayer {
    certificate_repository: Arc<dyn CertificateRepository>,
    template_repository: Arc<dyn TemplateRepository>,
    revocation_repository: Arc<dyn RevocationRepository>,
}

impl DataLayer {
    pub fn create() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Modification timestamps taken from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            certificate_repository: Arc::new(CertificateProvider::new(clock)),
            template_repository: Arc::new(TemplateProvider::default()),
            revocation_repository: Arc::new(RevocationProvider::default()),
        }
    }
}

impl Default for DataLayer {
    fn default() -> Self {
        Self::create()
    }
}

impl DataRepository for DataLayer {
    fn get_certificate_repository(&self) -> Arc<dyn CertificateRepository> {
        self.certificate_repository.clone()
    }

    fn get_template_repository(&self) -> Arc<dyn TemplateRepository> {
        self.template_repository.clone()
    }

    fn get_revocation_repository(&self) -> Arc<dyn RevocationRepository> {
        self.revocation_repository.clone()
    }
}
