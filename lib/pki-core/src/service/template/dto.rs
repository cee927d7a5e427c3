use shared_types::{CertificateId, UserId};

use crate::model::template::{ExtendedKeyUsage, KeyUsage};

#[derive(Clone, Debug)]
pub struct CreateTemplateRequestDTO {
    pub name: String,
    pub issuer_id: CertificateId,
    pub cn_regex: Option<String>,
    pub san_regex: Option<String>,
    pub max_ttl_days: Option<u32>,
    pub key_usage: Vec<KeyUsage>,
    pub extended_key_usage: Vec<ExtendedKeyUsage>,
    pub owner_id: Option<UserId>,
}
