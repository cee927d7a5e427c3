use rcgen::{
    BasicConstraints, CertificateParams, CustomExtension, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose, SerialNumber,
};
use secrecy::SecretString;
use shared_types::CertificateId;
use time::{Duration, OffsetDateTime};

use crate::model::certificate::{Certificate, CertificateState, CertificateType};
use crate::util::x509::{certificate_details, to_san_type};

/// Real certificate plus the rcgen handles needed to sign below it
pub(crate) struct TestCertificate {
    pub model: Certificate,
    pub certificate: rcgen::Certificate,
    pub key: KeyPair,
}

impl TestCertificate {
    pub fn private_key_pem(&self) -> SecretString {
        SecretString::from(self.key.serialize_pem())
    }
}

pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc().replace_nanosecond(0).unwrap()
}

pub(crate) fn generate_key() -> KeyPair {
    KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap()
}

fn to_model(
    certificate: &rcgen::Certificate,
    r#type: CertificateType,
    issuer_id: Option<CertificateId>,
) -> Certificate {
    let pem = certificate.pem();
    let details = certificate_details(&pem).unwrap();
    let now = now();

    Certificate {
        id: CertificateId::new_v4(),
        created_date: now,
        last_modified: now,
        serial_number: details.serial_number,
        subject: details.subject,
        issuer: details.issuer,
        public_key: details.public_key,
        certificate_pem: pem,
        private_key: None,
        valid_from: details.not_before,
        valid_to: details.not_after,
        r#type,
        state: CertificateState::Active,
        organization: Some("Acme".to_string()),
        issuer_id,
        owner_id: None,
        template_id: None,
    }
}

fn base_params(common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.distinguished_name.push(DnType::OrganizationName, "Acme");
    params.not_before = not_before;
    params.not_after = not_after;
    params.serial_number = Some(SerialNumber::from_slice(
        &pki_crypto::utilities::generate_random_bytes::<8>().map(|b| (b & 0x7f) | 0x01),
    ));
    params
}

pub(crate) fn root_certificate() -> TestCertificate {
    root_certificate_with_window(now() - Duration::days(1), now() + Duration::days(3650))
}

pub(crate) fn root_certificate_with_window(
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
) -> TestCertificate {
    let mut params = base_params("Root CA", not_before, not_after);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

    let key = generate_key();
    let certificate = params.self_signed(&key).unwrap();
    let model = to_model(&certificate, CertificateType::RootCa, None);

    TestCertificate {
        model,
        certificate,
        key,
    }
}

pub(crate) fn intermediate_certificate(
    issuer: &TestCertificate,
    path_len_constraint: Option<u8>,
) -> TestCertificate {
    let mut params = base_params(
        "Intermediate CA",
        issuer.model.valid_from,
        issuer.model.valid_to,
    );
    params.is_ca = IsCa::Ca(match path_len_constraint {
        Some(value) => BasicConstraints::Constrained(value),
        None => BasicConstraints::Unconstrained,
    });
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

    let key = generate_key();
    let certificate = params
        .signed_by(&key, &issuer.certificate, &issuer.key)
        .unwrap();
    let model = to_model(
        &certificate,
        CertificateType::IntermediateCa,
        Some(issuer.model.id),
    );

    TestCertificate {
        model,
        certificate,
        key,
    }
}

pub(crate) fn end_entity_certificate(issuer: &TestCertificate) -> TestCertificate {
    let mut params = base_params("web-01", issuer.model.valid_from, issuer.model.valid_to);
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];

    let key = generate_key();
    let certificate = params
        .signed_by(&key, &issuer.certificate, &issuer.key)
        .unwrap();
    let model = to_model(&certificate, CertificateType::EndEntity, Some(issuer.model.id));

    TestCertificate {
        model,
        certificate,
        key,
    }
}

/// DER of a BasicConstraints value with `cA = TRUE`
const CA_BASIC_CONSTRAINTS: [u8; 5] = [0x30, 0x03, 0x01, 0x01, 0xff];

pub(crate) fn csr_pem(
    subject: &[(DnType, &str)],
    subject_alt_names: &[&str],
    requests_ca: bool,
) -> (String, KeyPair) {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    for (dn_type, value) in subject {
        params.distinguished_name.push(dn_type.clone(), *value);
    }
    params.subject_alt_names = subject_alt_names
        .iter()
        .map(|san| to_san_type(san).unwrap())
        .collect();
    if requests_ca {
        let mut extension =
            CustomExtension::from_oid_content(&[2, 5, 29, 19], CA_BASIC_CONSTRAINTS.to_vec());
        extension.set_criticality(true);
        params.custom_extensions.push(extension);
    }

    let key = generate_key();
    let csr = params.serialize_request(&key).unwrap();
    (csr.pem().unwrap(), key)
}

pub(crate) fn web_csr() -> String {
    csr_pem(
        &[
            (DnType::CommonName, "web-01"),
            (DnType::OrganizationName, "Acme"),
        ],
        &["web-01.acme.test"],
        false,
    )
    .0
}

pub(crate) fn ca_csr() -> String {
    csr_pem(
        &[
            (DnType::CommonName, "Issuing CA"),
            (DnType::OrganizationName, "Acme"),
        ],
        &[],
        true,
    )
    .0
}

/// Model of `certificate` with its private key sealed under the custodian's current key
pub(crate) async fn custodied(
    certificate: &TestCertificate,
    custodian: &dyn crate::proto::key_custodian::KeyCustodian,
) -> Certificate {
    let master_key = custodian.get_current_master_key().await.unwrap();
    let mut model = certificate.model.clone();
    custodian
        .store_private_key(&mut model, &certificate.private_key_pem(), &master_key)
        .unwrap();
    model
}

/// Flips one base64 character inside the trailing signature bytes
pub(crate) fn tamper_signature(pem: &str) -> String {
    let lines: Vec<&str> = pem.trim().lines().collect();
    let (header, footer) = (lines[0], lines[lines.len() - 1]);
    let mut body: Vec<char> = lines[1..lines.len() - 1].concat().chars().collect();

    let unpadded = body.iter().rposition(|c| *c != '=').unwrap() + 1;
    let index = unpadded - 10;
    body[index] = if body[index] == 'A' { 'B' } else { 'A' };

    let body: String = body.into_iter().collect();
    let mut tampered = vec![header.to_owned()];
    tampered.extend(
        body.as_bytes()
            .chunks(64)
            .map(|chunk| String::from_utf8(chunk.to_vec()).unwrap()),
    );
    tampered.push(footer.to_owned());
    tampered.join("\n")
}
