//! PKCS#10 parsing and proof-of-possession

use thiserror::Error;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::extensions::ParsedExtension;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::FromDer;

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::model::csr::ParsedCsr;
use crate::util::x509::{
    common_name, general_name_to_string, organization, to_distinguished_name,
};

const CSR_LABELS: [&str; 2] = ["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

#[derive(Debug, Error)]
pub enum CsrError {
    #[error("Invalid CSR format: {0}")]
    InvalidCsrFormat(String),
    #[error("CSR signature does not verify against its own public key")]
    InvalidCsrSignature,
}

impl ErrorCodeMixin for CsrError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidCsrFormat(_) => ErrorCode::BR_0030,
            Self::InvalidCsrSignature => ErrorCode::BR_0031,
        }
    }
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CsrVerifier: Send + Sync {
    /// Decodes the request without checking its signature
    fn parse(&self, pem: &str) -> Result<ParsedCsr, CsrError>;

    /// `true` if the self-signature verifies against the embedded public key
    fn validate_csr_signature(&self, pem: &str) -> Result<bool, CsrError>;

    /// [`CsrVerifier::parse`] preceded by a mandatory proof-of-possession check
    fn verify(&self, pem: &str) -> Result<ParsedCsr, CsrError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsrVerifierImpl;

impl CsrVerifierImpl {
    fn with_request<T>(
        pem: &str,
        f: impl FnOnce(&X509CertificationRequest) -> Result<T, CsrError>,
    ) -> Result<T, CsrError> {
        let (_, pem) = parse_x509_pem(pem.trim().as_bytes())
            .map_err(|err| CsrError::InvalidCsrFormat(err.to_string()))?;
        if !CSR_LABELS.contains(&pem.label.as_str()) {
            return Err(CsrError::InvalidCsrFormat(format!(
                "unexpected PEM label `{}`",
                pem.label
            )));
        }

        let (_, request) = X509CertificationRequest::from_der(&pem.contents)
            .map_err(|err| CsrError::InvalidCsrFormat(err.to_string()))?;

        f(&request)
    }
}

impl CsrVerifier for CsrVerifierImpl {
    fn parse(&self, pem: &str) -> Result<ParsedCsr, CsrError> {
        Self::with_request(pem, |request| {
            let info = &request.certification_request_info;

            let mut subject_alt_names = vec![];
            let mut requests_ca = false;
            for extension in request.requested_extensions().into_iter().flatten() {
                match extension {
                    ParsedExtension::SubjectAlternativeName(san) => subject_alt_names.extend(
                        san.general_names.iter().filter_map(general_name_to_string),
                    ),
                    ParsedExtension::BasicConstraints(constraints) => {
                        requests_ca = constraints.ca;
                    }
                    _ => {}
                }
            }

            Ok(ParsedCsr {
                pem: pem.trim().to_owned(),
                subject: info.subject.to_string(),
                subject_name: to_distinguished_name(&info.subject),
                common_name: common_name(&info.subject),
                organization: organization(&info.subject),
                subject_alt_names,
                requests_ca,
                public_key: info.subject_pki.raw.to_vec(),
            })
        })
    }

    fn validate_csr_signature(&self, pem: &str) -> Result<bool, CsrError> {
        Self::with_request(pem, |request| Ok(request.verify_signature().is_ok()))
    }

    fn verify(&self, pem: &str) -> Result<ParsedCsr, CsrError> {
        if !self.validate_csr_signature(pem)? {
            tracing::warn!("rejecting CSR with invalid proof-of-possession");
            return Err(CsrError::InvalidCsrSignature);
        }
        self.parse(pem)
    }
}
