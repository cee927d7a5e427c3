use std::net::IpAddr;

use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, Ia5String, KeyPair,
    KeyUsagePurpose, SanType, SignatureAlgorithm,
};
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::oid_registry::{
    OID_X509_COMMON_NAME, OID_X509_COUNTRY_NAME, OID_X509_LOCALITY_NAME,
    OID_X509_ORGANIZATIONAL_UNIT, OID_X509_ORGANIZATION_NAME, OID_X509_STATE_OR_PROVINCE_NAME,
};
use x509_parser::pem::{Pem, parse_x509_pem};
use x509_parser::prelude::{X509Certificate, X509Name};

use crate::config::core_config::KeyAlgorithmType;
use crate::model::template::{ExtendedKeyUsage, KeyUsage};

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ParsingError(pub String);

/// Attributes read back from an encoded certificate
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateDetails {
    pub serial_number: String,
    pub subject: String,
    pub issuer: String,
    pub public_key: Vec<u8>,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub is_ca: bool,
    pub path_len_constraint: Option<u32>,
}

pub fn decode_certificate_pem(pem: &str) -> Result<Pem, ParsingError> {
    let (_, pem) = parse_x509_pem(pem.as_bytes()).map_err(|err| ParsingError(err.to_string()))?;
    if pem.label != CERTIFICATE_LABEL {
        return Err(ParsingError(format!("unexpected PEM label `{}`", pem.label)));
    }
    Ok(pem)
}

pub fn parse_certificate(pem: &Pem) -> Result<X509Certificate<'_>, ParsingError> {
    pem.parse_x509().map_err(|err| ParsingError(err.to_string()))
}

pub fn certificate_details(pem: &str) -> Result<CertificateDetails, ParsingError> {
    let pem = decode_certificate_pem(pem)?;
    let certificate = parse_certificate(&pem)?;
    let validity = certificate.validity();
    let (is_ca, path_len_constraint) = basic_constraints(&certificate).unwrap_or((false, None));

    Ok(CertificateDetails {
        serial_number: hex::encode(certificate.raw_serial()),
        subject: certificate.subject().to_string(),
        issuer: certificate.issuer().to_string(),
        public_key: certificate.public_key().raw.to_vec(),
        not_before: validity.not_before.to_datetime(),
        not_after: validity.not_after.to_datetime(),
        is_ca,
        path_len_constraint,
    })
}

/// `(ca, pathLenConstraint)` of the BasicConstraints extension, if present
pub fn basic_constraints(certificate: &X509Certificate) -> Option<(bool, Option<u32>)> {
    certificate
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => Some((bc.ca, bc.path_len_constraint)),
            _ => None,
        })
}

pub fn common_name(name: &X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(ToString::to_string)
}

pub fn organization(name: &X509Name) -> Option<String> {
    name.iter_organization()
        .next()
        .and_then(|o| o.as_str().ok())
        .map(ToString::to_string)
}

pub fn to_distinguished_name(name: &X509Name) -> DistinguishedName {
    let mut distinguished_name = DistinguishedName::new();
    for attribute in name.iter_attributes() {
        let Ok(value) = attribute.as_str() else {
            continue;
        };

        let oid = attribute.attr_type();
        let dn_type = if *oid == OID_X509_COMMON_NAME {
            DnType::CommonName
        } else if *oid == OID_X509_ORGANIZATION_NAME {
            DnType::OrganizationName
        } else if *oid == OID_X509_ORGANIZATIONAL_UNIT {
            DnType::OrganizationalUnitName
        } else if *oid == OID_X509_COUNTRY_NAME {
            DnType::CountryName
        } else if *oid == OID_X509_LOCALITY_NAME {
            DnType::LocalityName
        } else if *oid == OID_X509_STATE_OR_PROVINCE_NAME {
            DnType::StateOrProvinceName
        } else {
            match oid.iter() {
                Some(arcs) => DnType::CustomDnType(arcs.collect()),
                None => continue,
            }
        };

        distinguished_name.push(dn_type, value);
    }
    distinguished_name
}

pub fn general_name_to_string(name: &GeneralName) -> Option<String> {
    match name {
        GeneralName::DNSName(value) | GeneralName::RFC822Name(value) | GeneralName::URI(value) => {
            Some(value.to_string())
        }
        GeneralName::IPAddress(bytes) => match bytes.len() {
            4 => <[u8; 4]>::try_from(*bytes)
                .ok()
                .map(|octets| IpAddr::from(octets).to_string()),
            16 => <[u8; 16]>::try_from(*bytes)
                .ok()
                .map(|octets| IpAddr::from(octets).to_string()),
            _ => None,
        },
        _ => None,
    }
}

pub fn to_san_type(value: &str) -> Result<SanType, ParsingError> {
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Ok(SanType::IpAddress(ip));
    }

    let ia5 = Ia5String::try_from(value.to_string())
        .map_err(|err| ParsingError(format!("invalid subject alternative name {value}: {err}")))?;

    Ok(if value.contains("://") {
        SanType::URI(ia5)
    } else if value.contains('@') {
        SanType::Rfc822Name(ia5)
    } else {
        SanType::DnsName(ia5)
    })
}

pub fn key_usage_purpose(usage: KeyUsage) -> KeyUsagePurpose {
    match usage {
        KeyUsage::DigitalSignature => KeyUsagePurpose::DigitalSignature,
        KeyUsage::ContentCommitment => KeyUsagePurpose::ContentCommitment,
        KeyUsage::KeyEncipherment => KeyUsagePurpose::KeyEncipherment,
        KeyUsage::DataEncipherment => KeyUsagePurpose::DataEncipherment,
        KeyUsage::KeyAgreement => KeyUsagePurpose::KeyAgreement,
        KeyUsage::KeyCertSign => KeyUsagePurpose::KeyCertSign,
        KeyUsage::CrlSign => KeyUsagePurpose::CrlSign,
    }
}

pub fn extended_key_usage_purpose(usage: ExtendedKeyUsage) -> ExtendedKeyUsagePurpose {
    match usage {
        ExtendedKeyUsage::ServerAuth => ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsage::ClientAuth => ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsage::CodeSigning => ExtendedKeyUsagePurpose::CodeSigning,
        ExtendedKeyUsage::EmailProtection => ExtendedKeyUsagePurpose::EmailProtection,
        ExtendedKeyUsage::TimeStamping => ExtendedKeyUsagePurpose::TimeStamping,
        ExtendedKeyUsage::OcspSigning => ExtendedKeyUsagePurpose::OcspSigning,
    }
}

pub fn signature_algorithm(key_algorithm: KeyAlgorithmType) -> &'static SignatureAlgorithm {
    match key_algorithm {
        KeyAlgorithmType::EcdsaP256 => &rcgen::PKCS_ECDSA_P256_SHA256,
        KeyAlgorithmType::EcdsaP384 => &rcgen::PKCS_ECDSA_P384_SHA384,
        KeyAlgorithmType::Eddsa => &rcgen::PKCS_ED25519,
    }
}

pub fn generate_key_pair(key_algorithm: KeyAlgorithmType) -> Result<KeyPair, rcgen::Error> {
    KeyPair::generate_for(signature_algorithm(key_algorithm))
}

/// Rebuilds a signing issuer from its stored certificate and decrypted key
pub fn load_issuer(
    certificate_pem: &str,
    private_key_pem: &SecretString,
) -> Result<(rcgen::Certificate, KeyPair), rcgen::Error> {
    let key = KeyPair::from_pem(private_key_pem.expose_secret())?;
    let params = CertificateParams::from_ca_cert_pem(certificate_pem)?;
    let certificate = params.self_signed(&key)?;
    Ok((certificate, key))
}

#[cfg(test)]
mod tests {
    use rcgen::{BasicConstraints, IsCa};

    use super::*;

    #[test]
    fn test_certificate_details_reads_constraints() {
        let key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, "Test CA");
        params.distinguished_name.push(DnType::OrganizationName, "Acme");
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(3));
        let certificate = params.self_signed(&key).unwrap();

        let details = certificate_details(&certificate.pem()).unwrap();
        assert!(details.is_ca);
        assert_eq!(details.path_len_constraint, Some(3));
        assert_eq!(details.subject, details.issuer);
        assert!(details.subject.contains("CN=Test CA"));
        assert_eq!(details.public_key, key.public_key_der());
    }

    #[test]
    fn test_decode_rejects_non_certificate() {
        let key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        assert!(decode_certificate_pem(&key.serialize_pem()).is_err());
        assert!(decode_certificate_pem("garbage").is_err());
    }

    #[test]
    fn test_to_san_type() {
        assert!(matches!(
            to_san_type("10.0.0.1").unwrap(),
            SanType::IpAddress(_)
        ));
        assert!(matches!(
            to_san_type("web-01.acme.test").unwrap(),
            SanType::DnsName(_)
        ));
        assert!(matches!(
            to_san_type("admin@acme.test").unwrap(),
            SanType::Rfc822Name(_)
        ));
        assert!(matches!(
            to_san_type("https://acme.test").unwrap(),
            SanType::URI(_)
        ));
        assert!(to_san_type("bücher.test").is_err());
    }

    #[test]
    fn test_load_issuer_signs_children() {
        let key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, "Issuer");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let issuer = params.self_signed(&key).unwrap();

        let (rebuilt, issuer_key) =
            load_issuer(&issuer.pem(), &SecretString::from(key.serialize_pem())).unwrap();

        let child_key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let mut child_params = CertificateParams::default();
        child_params.distinguished_name.push(DnType::CommonName, "Child");
        let child = child_params
            .signed_by(&child_key, &rebuilt, &issuer_key)
            .unwrap();

        let issuer_pem = decode_certificate_pem(&issuer.pem()).unwrap();
        let issuer_x509 = parse_certificate(&issuer_pem).unwrap();
        let child_pem = decode_certificate_pem(&child.pem()).unwrap();
        let child_x509 = parse_certificate(&child_pem).unwrap();

        assert!(
            child_x509
                .verify_signature(Some(issuer_x509.public_key()))
                .is_ok()
        );
        assert_eq!(child_x509.issuer().to_string(), issuer_x509.subject().to_string());
    }
}
