use pki_core::model::template::CertificateTemplate;
use tokio::sync::RwLock;

pub mod repository;

#[derive(Default)]
pub(crate) struct TemplateProvider {
    pub templates: RwLock<Vec<CertificateTemplate>>,
}

#[cfg(test)]
mod test;
