use serde::{Deserialize, Serialize};
use shared_types::{CertificateId, RevocationId, UserId};
use strum::{Display, EnumString};
use time::OffsetDateTime;

/// Append-only revocation record
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevokedCertificate {
    pub id: RevocationId,
    pub certificate_id: CertificateId,
    pub revoked_at: OffsetDateTime,
    pub reason: RevocationReason,
    pub revoked_by: UserId,
}

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}
