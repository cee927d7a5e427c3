use time::OffsetDateTime;

use super::dto::{CertificateResponseDTO, GetCertificateListResponseDTO};
use crate::model::certificate::{Certificate, GetCertificateList};

pub(super) fn certificate_response(
    certificate: Certificate,
    now: OffsetDateTime,
) -> CertificateResponseDTO {
    CertificateResponseDTO {
        state: certificate.effective_state(now),
        has_private_key: certificate.private_key.is_some(),
        id: certificate.id,
        created_date: certificate.created_date,
        last_modified: certificate.last_modified,
        serial_number: certificate.serial_number,
        subject: certificate.subject,
        issuer: certificate.issuer,
        certificate_pem: certificate.certificate_pem,
        valid_from: certificate.valid_from,
        valid_to: certificate.valid_to,
        r#type: certificate.r#type,
        organization: certificate.organization,
        issuer_id: certificate.issuer_id,
        owner_id: certificate.owner_id,
        template_id: certificate.template_id,
    }
}

pub(super) fn certificate_list_response(
    certificates: Vec<Certificate>,
    now: OffsetDateTime,
) -> Vec<CertificateResponseDTO> {
    certificates
        .into_iter()
        .map(|certificate| certificate_response(certificate, now))
        .collect()
}

pub(super) fn certificate_page_response(
    page: GetCertificateList,
    now: OffsetDateTime,
) -> GetCertificateListResponseDTO {
    GetCertificateListResponseDTO {
        values: certificate_list_response(page.values, now),
        total_pages: page.total_pages,
        total_items: page.total_items,
    }
}
