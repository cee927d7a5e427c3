//! Issuer chain construction and validation over the certificate store

use std::sync::Arc;

use shared_types::CertificateId;
use thiserror::Error;
use time::OffsetDateTime;

use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::model::certificate::{Certificate, CertificateState};
use crate::proto::clock::Clock;
use crate::repository::certificate_repository::CertificateRepository;
use crate::repository::error::DataLayerError;

mod validator;

/// Maximum number of certificates in a chain, leaf and root included
pub const MAX_CHAIN_DEPTH: usize = 10;

#[derive(Debug, Error)]
pub enum ChainValidationError {
    #[error("Issuer `{0}` not found")]
    IssuerNotFound(CertificateId),
    #[error("Issuer `{0}` is not a CA")]
    IssuerNotCA(CertificateId),
    #[error("Issuer `{id}` is {state}")]
    IssuerUnusable {
        id: CertificateId,
        state: CertificateState,
    },
    #[error("Issuer `{0}` is not currently valid")]
    IssuerNotCurrentlyValid(CertificateId),
    #[error(
        "Validity [{not_before}, {not_after}] outside of issuer window [{issuer_valid_from}, {issuer_valid_to}]"
    )]
    ChildOutOfIssuerWindow {
        not_before: OffsetDateTime,
        not_after: OffsetDateTime,
        issuer_valid_from: OffsetDateTime,
        issuer_valid_to: OffsetDateTime,
    },
    #[error("Certificate chain exceeds maximum depth of {0}")]
    ChainTooDeep(usize),
    #[error("Circular certificate chain at `{0}`")]
    CircularChain(CertificateId),
    #[error("Certificate chain does not terminate at a root")]
    ChainDoesNotTerminateAtRoot,
    #[error("Chain member `{0}` is revoked or outside its validity window")]
    ChainMemberInvalid(CertificateId),
    #[error("Invalid signature on `{0}`")]
    InvalidSignature(CertificateId),
    #[error("Invalid self-signature on root `{0}`")]
    InvalidSelfSignature(CertificateId),
    #[error(
        "Path length constraint of `{id}` violated: constraint={constraint}, intermediate CAs={intermediates}"
    )]
    PathLengthViolated {
        id: CertificateId,
        constraint: u32,
        intermediates: usize,
    },
    #[error("Path length budget of issuer `{0}` is exhausted")]
    IssuerPathLengthExhausted(CertificateId),
    #[error("Certificate parsing failed: {0}")]
    CertificateParsing(String),
    #[error(transparent)]
    Repository(#[from] DataLayerError),
}

impl ErrorCodeMixin for ChainValidationError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::IssuerNotFound(_) => ErrorCode::BR_0010,
            Self::IssuerNotCA(_) => ErrorCode::BR_0011,
            Self::IssuerUnusable { .. } => ErrorCode::BR_0012,
            Self::IssuerNotCurrentlyValid(_) => ErrorCode::BR_0013,
            Self::ChildOutOfIssuerWindow { .. } => ErrorCode::BR_0014,
            Self::ChainTooDeep(_) => ErrorCode::BR_0015,
            Self::CircularChain(_) => ErrorCode::BR_0016,
            Self::ChainDoesNotTerminateAtRoot => ErrorCode::BR_0017,
            Self::ChainMemberInvalid(_) => ErrorCode::BR_0018,
            Self::InvalidSignature(_) => ErrorCode::BR_0019,
            Self::InvalidSelfSignature(_) => ErrorCode::BR_0020,
            Self::PathLengthViolated { .. } => ErrorCode::BR_0021,
            Self::IssuerPathLengthExhausted(_) => ErrorCode::BR_0022,
            Self::CertificateParsing(_) => ErrorCode::BR_0023,
            Self::Repository(error) => error.error_code(),
        }
    }
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait ChainValidator: Send + Sync {
    /// Checks, failing on the first violation:
    /// * issuer is a CA
    /// * issuer is not revoked or expired
    /// * issuer is currently valid
    /// * the proposed window is contained in the issuer window
    /// * the chain from the issuer up to its root validates
    async fn validate_issuer_before_signing(
        &self,
        issuer: &Certificate,
        not_before: OffsetDateTime,
        not_after: OffsetDateTime,
    ) -> Result<(), ChainValidationError>;

    /// Ordered chain starting with `certificate` and ending with its root
    async fn build_chain_to_root(
        &self,
        certificate: &Certificate,
    ) -> Result<Vec<Certificate>, ChainValidationError>;

    fn validate_chain(&self, chain: &[Certificate]) -> Result<(), ChainValidationError>;

    /// Path length budget for a new intermediate CA signed by `issuer`
    fn calculate_path_length_for_new_ca(
        &self,
        issuer: &Certificate,
    ) -> Result<u8, ChainValidationError>;
}

pub struct ChainValidatorImpl {
    certificate_repository: Arc<dyn CertificateRepository>,
    clock: Arc<dyn Clock>,
    default_path_length: u8,
}

impl ChainValidatorImpl {
    pub fn new(
        certificate_repository: Arc<dyn CertificateRepository>,
        clock: Arc<dyn Clock>,
        default_path_length: u8,
    ) -> Self {
        Self {
            certificate_repository,
            clock,
            default_path_length,
        }
    }
}
