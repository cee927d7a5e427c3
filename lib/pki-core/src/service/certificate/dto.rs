use shared_types::{CertificateId, TemplateId, UserId};
use time::OffsetDateTime;

use crate::model::certificate::{CertificateState, CertificateType};
use crate::model::list_query::GetListResponse;

/// Subject overrides for a new root, unset fields fall back to configuration
#[derive(Clone, Debug, Default)]
pub struct RootCertificateRequestDTO {
    pub common_name: Option<String>,
    pub organization: Option<String>,
    pub ttl_days: Option<u32>,
    pub owner_id: Option<UserId>,
}

#[derive(Clone, Debug)]
pub struct IssueCertificateRequestDTO {
    /// PEM encoded PKCS#10 request
    pub csr: String,
    pub issuer_id: CertificateId,
    pub requested_by: Option<UserId>,
    pub ttl_days: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct IssueWithTemplateRequestDTO {
    pub template_id: TemplateId,
    pub csr: String,
    pub requested_by: Option<UserId>,
    pub ttl_days: Option<u32>,
}

/// End-entity certificate whose key pair is generated and custodied by the CA
#[derive(Clone, Debug)]
pub struct ServerCertificateRequestDTO {
    pub common_name: String,
    pub subject_alt_names: Vec<String>,
    pub issuer_id: CertificateId,
    pub requested_by: Option<UserId>,
    pub ttl_days: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateResponseDTO {
    pub id: CertificateId,
    pub created_date: OffsetDateTime,
    pub last_modified: OffsetDateTime,
    pub serial_number: String,
    pub subject: String,
    pub issuer: String,
    pub certificate_pem: String,
    pub valid_from: OffsetDateTime,
    pub valid_to: OffsetDateTime,
    pub r#type: CertificateType,
    /// Stored state, `EXPIRED` once the validity window has passed
    pub state: CertificateState,
    pub organization: Option<String>,
    pub issuer_id: Option<CertificateId>,
    pub owner_id: Option<UserId>,
    pub template_id: Option<TemplateId>,
    pub has_private_key: bool,
}

pub type GetCertificateListResponseDTO = GetListResponse<CertificateResponseDTO>;
