use std::sync::Arc;

use memory_data_provider::DataLayer;
use pki_core::PkiCore;
use pki_core::config::core_config::CoreConfig;
use pki_core::service::certificate::dto::{
    CertificateResponseDTO, IssueCertificateRequestDTO, RootCertificateRequestDTO,
};
use rcgen::{CertificateParams, CustomExtension, DnType, KeyPair};
use shared_types::{CertificateId, UserId};

/// DER of a BasicConstraints value with `cA = TRUE`
const CA_BASIC_CONSTRAINTS: [u8; 5] = [0x30, 0x03, 0x01, 0x01, 0xff];

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn core_with(config: CoreConfig, data_layer: &DataLayer) -> PkiCore {
    init_tracing();
    PkiCore::new(config, Arc::new(data_layer.clone())).unwrap()
}

pub fn csr(common_name: &str, subject_alt_names: &[&str], requests_ca: bool) -> String {
    let mut params = CertificateParams::new(
        subject_alt_names
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>(),
    )
    .unwrap();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.distinguished_name.push(DnType::OrganizationName, "Acme");
    if requests_ca {
        let mut extension =
            CustomExtension::from_oid_content(&[2, 5, 29, 19], CA_BASIC_CONSTRAINTS.to_vec());
        extension.set_criticality(true);
        params.custom_extensions.push(extension);
    }

    let key = KeyPair::generate().unwrap();
    params.serialize_request(&key).unwrap().pem().unwrap()
}

pub async fn issue_root(core: &PkiCore) -> CertificateResponseDTO {
    core.certificate_service
        .issue_root(RootCertificateRequestDTO {
            organization: Some("Acme".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub fn request(csr: String, issuer_id: CertificateId) -> IssueCertificateRequestDTO {
    IssueCertificateRequestDTO {
        csr,
        issuer_id,
        requested_by: Some(UserId::new_v4()),
        ttl_days: None,
    }
}
