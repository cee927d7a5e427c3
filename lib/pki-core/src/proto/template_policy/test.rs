use rcgen::{DistinguishedName, DnType};
use rstest::rstest;
use shared_types::{CertificateId, TemplateId};

use super::{PolicyViolation, TemplatePolicy, TemplatePolicyError, TemplatePolicyImpl};
use crate::model::csr::{CertificateSigningRequest, ParsedCsr};
use crate::model::template::{CertificateTemplate, ExtendedKeyUsage, KeyUsage};
use crate::proto::csr_verifier::{CsrVerifier, CsrVerifierImpl};
use crate::test_utilities::{csr_pem, now, web_csr};

fn csr(common_name: Option<&str>, subject_alt_names: &[&str]) -> ParsedCsr {
    ParsedCsr {
        pem: String::new(),
        subject: common_name
            .map(|cn| format!("CN={cn}, O=Acme"))
            .unwrap_or_else(|| "O=Acme".to_string()),
        subject_name: DistinguishedName::new(),
        common_name: common_name.map(ToString::to_string),
        organization: Some("Acme".to_string()),
        subject_alt_names: subject_alt_names.iter().map(ToString::to_string).collect(),
        requests_ca: false,
        public_key: vec![],
    }
}

fn template() -> CertificateTemplate {
    CertificateTemplate {
        id: TemplateId::new_v4(),
        created_date: now(),
        last_modified: now(),
        name: "web servers".to_string(),
        issuer_id: CertificateId::new_v4(),
        cn_regex: None,
        san_regex: None,
        max_ttl_days: None,
        key_usage: vec![],
        extended_key_usage: vec![],
        owner_id: None,
    }
}

fn web_template() -> CertificateTemplate {
    CertificateTemplate {
        cn_regex: Some("CN=web-.*".to_string()),
        max_ttl_days: Some(90),
        ..template()
    }
}

#[rstest]
#[case::web_within_ttl(Some("web-01"), Some(30), None)]
#[case::ttl_at_cap(Some("web-01"), Some(90), None)]
#[case::wrong_common_name(Some("db-01"), Some(30), Some(PolicyViolation::Cn))]
#[case::ttl_above_cap(Some("web-01"), Some(120), Some(PolicyViolation::Ttl))]
#[case::missing_ttl(Some("web-01"), None, Some(PolicyViolation::Ttl))]
#[case::missing_common_name(None, Some(30), Some(PolicyViolation::Cn))]
#[case::prefix_only(Some("xweb-01"), Some(30), Some(PolicyViolation::Cn))]
fn test_web_template(
    #[case] common_name: Option<&str>,
    #[case] ttl: Option<u32>,
    #[case] expected: Option<PolicyViolation>,
) {
    let result = TemplatePolicyImpl.check(&csr(common_name, &[]), &web_template(), ttl);

    match expected {
        None => assert!(result.is_ok()),
        Some(violation) => assert!(matches!(
            result,
            Err(TemplatePolicyError::PolicyViolation(actual)) if actual == violation
        )),
    }
    assert_eq!(
        TemplatePolicyImpl.validate_against_template(&csr(common_name, &[]), &web_template(), ttl),
        expected.is_none()
    );
}

#[test]
fn test_common_name_pattern_matches_bare_value() {
    let template = CertificateTemplate {
        cn_regex: Some("web-\\d+".to_string()),
        ..template()
    };

    assert!(TemplatePolicyImpl.validate_against_template(&csr(Some("web-01"), &[]), &template, None));
    assert!(!TemplatePolicyImpl.validate_against_template(&csr(Some("web-xx"), &[]), &template, None));
}

#[rstest]
#[case::single(&["web-01.acme.test"], true)]
#[case::multiple(&["web-01.acme.test", "web-02.acme.test"], true)]
#[case::foreign_domain(&["web-01.evil.test"], false)]
#[case::one_foreign(&["web-01.acme.test", "web-01.evil.test"], false)]
#[case::absent(&[], false)]
fn test_san_pattern(#[case] subject_alt_names: &[&str], #[case] allowed: bool) {
    let template = CertificateTemplate {
        san_regex: Some("[a-z0-9-]+\\.acme\\.test(,[a-z0-9-]+\\.acme\\.test)*".to_string()),
        ..template()
    };

    assert_eq!(
        TemplatePolicyImpl.validate_against_template(
            &csr(Some("web-01"), subject_alt_names),
            &template,
            None
        ),
        allowed
    );
}

#[test]
fn test_unrestricted_template_accepts_anything() {
    assert!(TemplatePolicyImpl.validate_against_template(&csr(None, &[]), &template(), None));
}

#[test]
fn test_invalid_pattern() {
    let template = CertificateTemplate {
        cn_regex: Some("web-(".to_string()),
        ..template()
    };

    assert!(matches!(
        TemplatePolicyImpl.check(&csr(Some("web-01"), &[]), &template, None),
        Err(TemplatePolicyError::InvalidPattern { .. })
    ));
}

#[test]
fn test_parsed_request_against_template() {
    let parsed = CsrVerifierImpl.verify(&web_csr()).unwrap();
    let template = CertificateTemplate {
        san_regex: Some(".*\\.acme\\.test".to_string()),
        ..web_template()
    };

    assert!(TemplatePolicyImpl.validate_against_template(&parsed, &template, Some(30)));
    assert!(!TemplatePolicyImpl.validate_against_template(&parsed, &template, Some(120)));
}

#[test]
fn test_parsed_request_without_common_name_against_template() {
    let (pem, _) = csr_pem(&[(DnType::OrganizationName, "Acme")], &[], false);
    let parsed = CsrVerifierImpl.verify(&pem).unwrap();
    assert_eq!(parsed.common_name, None);

    assert!(matches!(
        TemplatePolicyImpl.check(&parsed, &web_template(), Some(30)),
        Err(TemplatePolicyError::PolicyViolation(PolicyViolation::Cn))
    ));
    assert!(TemplatePolicyImpl.validate_against_template(&parsed, &template(), Some(30)));
}

#[test]
fn test_apply_template() {
    let template = CertificateTemplate {
        key_usage: vec![KeyUsage::DigitalSignature],
        extended_key_usage: vec![ExtendedKeyUsage::ServerAuth],
        ..template()
    };
    let original = csr(Some("web-01"), &["web-01.acme.test"]);
    let mut request = CertificateSigningRequest {
        csr: original.clone(),
        requested_by: None,
        ttl_days: Some(30),
        applied_template: None,
    };

    TemplatePolicyImpl.apply_template(&mut request, &template);

    let applied = request.applied_template.unwrap();
    assert_eq!(applied.template_id, template.id);
    assert_eq!(applied.key_usage, vec![KeyUsage::DigitalSignature]);
    assert_eq!(applied.extended_key_usage, vec![ExtendedKeyUsage::ServerAuth]);
    assert_eq!(request.csr, original);
}
