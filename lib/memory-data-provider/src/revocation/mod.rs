use pki_core::model::revocation::RevokedCertificate;
use tokio::sync::RwLock;

pub mod repository;

#[derive(Default)]
pub(crate) struct RevocationProvider {
    pub revocations: RwLock<Vec<RevokedCertificate>>,
}
