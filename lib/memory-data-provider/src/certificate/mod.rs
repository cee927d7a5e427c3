use std::sync::Arc;

use pki_core::model::certificate::Certificate;
use pki_core::proto::clock::{Clock, DefaultClock};
use tokio::sync::RwLock;

pub mod repository;

/// Certificates in insertion order
pub(crate) struct CertificateProvider {
    pub certificates: RwLock<Vec<Certificate>>,
    pub clock: Arc<dyn Clock>,
}

impl CertificateProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            certificates: RwLock::default(),
            clock,
        }
    }
}

impl Default for CertificateProvider {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}
