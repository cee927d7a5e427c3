use std::sync::Arc;

use crate::proto::clock::Clock;
use crate::proto::key_custodian::KeyCustodian;
use crate::provider::audit::AuditSink;
use crate::repository::certificate_repository::CertificateRepository;
use crate::repository::revocation_repository::RevocationRepository;

pub mod dto;
pub mod service;

/// Validity of a generated CRL
pub(crate) const CRL_VALIDITY_DAYS: i64 = 7;

#[derive(Clone)]
pub struct RevocationService {
    certificate_repository: Arc<dyn CertificateRepository>,
    revocation_repository: Arc<dyn RevocationRepository>,
    key_custodian: Arc<dyn KeyCustodian>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl RevocationService {
    pub fn new(
        certificate_repository: Arc<dyn CertificateRepository>,
        revocation_repository: Arc<dyn RevocationRepository>,
        key_custodian: Arc<dyn KeyCustodian>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            certificate_repository,
            revocation_repository,
            key_custodian,
            audit,
            clock,
        }
    }
}

#[cfg(test)]
mod test;
