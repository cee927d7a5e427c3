use rcgen::DistinguishedName;
use shared_types::{TemplateId, UserId};

use super::template::{ExtendedKeyUsage, KeyUsage};

/// Contents of a PKCS#10 request
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedCsr {
    pub pem: String,
    pub subject: String,
    /// Subject attributes as carried into the issued certificate
    pub subject_name: DistinguishedName,
    pub common_name: Option<String>,
    pub organization: Option<String>,
    pub subject_alt_names: Vec<String>,
    /// CA basic-constraints were requested
    pub requests_ca: bool,
    /// DER encoded SubjectPublicKeyInfo
    pub public_key: Vec<u8>,
}

/// Transient issuance input, never persisted
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateSigningRequest {
    pub csr: ParsedCsr,
    pub requested_by: Option<UserId>,
    pub ttl_days: Option<u32>,
    pub applied_template: Option<AppliedTemplate>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppliedTemplate {
    pub template_id: TemplateId,
    pub key_usage: Vec<KeyUsage>,
    pub extended_key_usage: Vec<ExtendedKeyUsage>,
}
