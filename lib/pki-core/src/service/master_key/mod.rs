use std::sync::Arc;

use crate::proto::key_custodian::KeyCustodian;
use crate::provider::audit::AuditSink;

pub mod service;

#[derive(Clone)]
pub struct MasterKeyService {
    key_custodian: Arc<dyn KeyCustodian>,
    audit: Arc<dyn AuditSink>,
}

impl MasterKeyService {
    pub fn new(key_custodian: Arc<dyn KeyCustodian>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            key_custodian,
            audit,
        }
    }
}
