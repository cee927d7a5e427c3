use serde::{Deserialize, Serialize};
use shared_types::{CertificateId, TemplateId, UserId};
use strum::Display;
use time::OffsetDateTime;

use super::list_query::{GetListResponse, ListPagination};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Certificate {
    pub id: CertificateId,
    pub created_date: OffsetDateTime,
    pub last_modified: OffsetDateTime,
    /// Lowercase hex of the DER serial number
    pub serial_number: String,
    pub subject: String,
    pub issuer: String,
    /// DER encoded SubjectPublicKeyInfo
    pub public_key: Vec<u8>,
    pub certificate_pem: String,
    pub private_key: Option<EncryptedPrivateKey>,
    pub valid_from: OffsetDateTime,
    pub valid_to: OffsetDateTime,
    pub r#type: CertificateType,
    pub state: CertificateState,
    pub organization: Option<String>,

    // Relations:
    pub issuer_id: Option<CertificateId>,
    pub owner_id: Option<UserId>,
    pub template_id: Option<TemplateId>,
}

impl Certificate {
    pub fn is_ca(&self) -> bool {
        self.r#type != CertificateType::EndEntity
    }

    pub fn is_within_validity(&self, at: OffsetDateTime) -> bool {
        self.valid_from <= at && at <= self.valid_to
    }

    /// Stored state with expiry derived from the wall clock
    pub fn effective_state(&self, now: OffsetDateTime) -> CertificateState {
        match self.state {
            CertificateState::Active if now > self.valid_to => CertificateState::Expired,
            state => state,
        }
    }
}

/// Private key sealed under the master key identified by `master_key_id`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedPrivateKey {
    pub master_key_id: String,
    pub ciphertext: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateType {
    RootCa,
    IntermediateCa,
    EndEntity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateState {
    Active,
    Revoked,
    Expired,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UpdateCertificateRequest {
    pub state: Option<CertificateState>,
    pub private_key: Option<EncryptedPrivateKey>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CertificateListQuery {
    pub pagination: ListPagination,
    pub state: Option<CertificateState>,
    pub r#type: Option<CertificateType>,
    pub organization: Option<String>,
}

pub type GetCertificateList = GetListResponse<Certificate>;
