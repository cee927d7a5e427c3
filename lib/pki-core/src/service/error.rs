use pki_crypto::encryption::EncryptionError;
use shared_types::{CertificateId, TemplateId};
use thiserror::Error;

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::proto::chain_validator::ChainValidationError;
use crate::proto::csr_verifier::CsrError;
use crate::proto::key_custodian::KeyCustodianError;
use crate::proto::template_policy::TemplatePolicyError;
use crate::repository::error::DataLayerError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    EntityNotFound(#[from] EntityNotFoundError),
    #[error(transparent)]
    BusinessLogic(#[from] BusinessLogicError),
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ChainValidation(#[from] ChainValidationError),
    #[error(transparent)]
    Csr(#[from] CsrError),
    #[error(transparent)]
    TemplatePolicy(#[from] TemplatePolicyError),
    #[error(transparent)]
    KeyCustodian(#[from] KeyCustodianError),
    #[error(transparent)]
    Repository(#[from] DataLayerError),

    #[error("Certificate generation failed: `{0}`")]
    CertificateGeneration(#[from] rcgen::Error),
    #[error("Encryption error: `{0}`")]
    Encryption(#[from] EncryptionError),
    #[error("Certificate parsing failed: `{0}`")]
    CertificateParsing(String),
}

#[derive(Debug, Error)]
pub enum EntityNotFoundError {
    #[error("Certificate `{0}` not found")]
    Certificate(CertificateId),
    #[error("Certificate template `{0}` not found")]
    Template(TemplateId),
}

#[derive(Debug, Error)]
pub enum BusinessLogicError {
    #[error("Certificate `{0}` is already revoked")]
    CertificateAlreadyRevoked(CertificateId),
    #[error("No unique serial number after {attempts} attempts")]
    SerialCollision { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid revocation reason `{0}`")]
    InvalidReason(String),
    #[error("TTL must be at least one day and within the representable date range")]
    InvalidTtl,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ErrorCodeMixin for ServiceError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EntityNotFound(error) => error.error_code(),
            Self::BusinessLogic(error) => error.error_code(),
            Self::Validation(error) => error.error_code(),
            Self::ChainValidation(error) => error.error_code(),
            Self::Csr(error) => error.error_code(),
            Self::TemplatePolicy(error) => error.error_code(),
            Self::KeyCustodian(error) => error.error_code(),
            Self::Repository(error) => error.error_code(),
            Self::CertificateGeneration(_) => ErrorCode::BR_0063,
            Self::Encryption(_) => ErrorCode::BR_0055,
            Self::CertificateParsing(_) => ErrorCode::BR_0023,
        }
    }
}

impl ErrorCodeMixin for EntityNotFoundError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Certificate(_) => ErrorCode::BR_0001,
            Self::Template(_) => ErrorCode::BR_0002,
        }
    }
}

impl ErrorCodeMixin for BusinessLogicError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::CertificateAlreadyRevoked(_) => ErrorCode::BR_0061,
            Self::SerialCollision { .. } => ErrorCode::BR_0060,
        }
    }
}

impl ErrorCodeMixin for ValidationError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidReason(_) => ErrorCode::BR_0062,
            Self::InvalidTtl | Self::InvalidRequest(_) => ErrorCode::BR_0064,
        }
    }
}
