use time::OffsetDateTime;

/// PEM encoded CRL of one issuer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateRevocationListDTO {
    pub pem: String,
    pub this_update: OffsetDateTime,
    pub next_update: OffsetDateTime,
    pub revoked_count: usize,
}
