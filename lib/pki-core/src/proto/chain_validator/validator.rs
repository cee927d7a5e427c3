use std::collections::HashSet;

use time::OffsetDateTime;

use super::{ChainValidationError, ChainValidator, ChainValidatorImpl, MAX_CHAIN_DEPTH};
use crate::model::certificate::{Certificate, CertificateState, CertificateType};
use crate::util::x509::{basic_constraints, decode_certificate_pem, parse_certificate};

#[async_trait::async_trait]
impl ChainValidator for ChainValidatorImpl {
    async fn validate_issuer_before_signing(
        &self,
        issuer: &Certificate,
        not_before: OffsetDateTime,
        not_after: OffsetDateTime,
    ) -> Result<(), ChainValidationError> {
        if issuer.r#type == CertificateType::EndEntity {
            return Err(ChainValidationError::IssuerNotCA(issuer.id));
        }

        if matches!(
            issuer.state,
            CertificateState::Revoked | CertificateState::Expired
        ) {
            return Err(ChainValidationError::IssuerUnusable {
                id: issuer.id,
                state: issuer.state,
            });
        }

        if !issuer.is_within_validity(self.clock.now_utc()) {
            return Err(ChainValidationError::IssuerNotCurrentlyValid(issuer.id));
        }

        if not_before < issuer.valid_from || not_after > issuer.valid_to {
            return Err(ChainValidationError::ChildOutOfIssuerWindow {
                not_before,
                not_after,
                issuer_valid_from: issuer.valid_from,
                issuer_valid_to: issuer.valid_to,
            });
        }

        let chain = self.build_chain_to_root(issuer).await?;
        self.validate_chain(&chain)
    }

    async fn build_chain_to_root(
        &self,
        certificate: &Certificate,
    ) -> Result<Vec<Certificate>, ChainValidationError> {
        let mut visited = HashSet::from([certificate.id]);
        let mut chain = vec![certificate.to_owned()];

        let mut next_issuer = certificate.issuer_id;
        while let Some(issuer_id) = next_issuer {
            if !visited.insert(issuer_id) {
                return Err(ChainValidationError::CircularChain(issuer_id));
            }

            if chain.len() >= MAX_CHAIN_DEPTH {
                return Err(ChainValidationError::ChainTooDeep(MAX_CHAIN_DEPTH));
            }

            let issuer = self
                .certificate_repository
                .get(issuer_id)
                .await?
                .ok_or(ChainValidationError::IssuerNotFound(issuer_id))?;

            next_issuer = issuer.issuer_id;
            chain.push(issuer);
        }

        Ok(chain)
    }

    fn validate_chain(&self, chain: &[Certificate]) -> Result<(), ChainValidationError> {
        let Some(root) = chain.last() else {
            return Err(ChainValidationError::ChainDoesNotTerminateAtRoot);
        };
        if root.issuer_id.is_some() || root.r#type != CertificateType::RootCa {
            return Err(ChainValidationError::ChainDoesNotTerminateAtRoot);
        }

        let now = self.clock.now_utc();
        for (index, member) in chain.iter().enumerate() {
            if member.state == CertificateState::Revoked
                || !member.is_within_validity(now)
                || (index > 0 && !member.is_ca())
            {
                return Err(ChainValidationError::ChainMemberInvalid(member.id));
            }
        }

        let pems = chain
            .iter()
            .map(|member| decode_certificate_pem(&member.certificate_pem))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ChainValidationError::CertificateParsing(err.to_string()))?;
        let certificates = pems
            .iter()
            .map(parse_certificate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ChainValidationError::CertificateParsing(err.to_string()))?;

        for (index, (member, certificate)) in chain.iter().zip(&certificates).enumerate() {
            match certificates.get(index + 1) {
                Some(parent) => certificate
                    .verify_signature(Some(parent.public_key()))
                    .map_err(|_| ChainValidationError::InvalidSignature(member.id))?,
                None => certificate
                    .verify_signature(Some(certificate.public_key()))
                    .map_err(|_| ChainValidationError::InvalidSelfSignature(member.id))?,
            }
        }

        self.validate_path_length(chain, &certificates)?;

        tracing::debug!(
            leaf = %chain[0].id,
            length = chain.len(),
            "certificate chain validated"
        );
        Ok(())
    }

    fn calculate_path_length_for_new_ca(
        &self,
        issuer: &Certificate,
    ) -> Result<u8, ChainValidationError> {
        if issuer.r#type == CertificateType::EndEntity {
            return Err(ChainValidationError::IssuerNotCA(issuer.id));
        }

        let pem = decode_certificate_pem(&issuer.certificate_pem)
            .map_err(|err| ChainValidationError::CertificateParsing(err.to_string()))?;
        let certificate = parse_certificate(&pem)
            .map_err(|err| ChainValidationError::CertificateParsing(err.to_string()))?;

        match basic_constraints(&certificate) {
            None | Some((false, _)) => Err(ChainValidationError::IssuerNotCA(issuer.id)),
            Some((true, Some(0))) => Err(ChainValidationError::IssuerPathLengthExhausted(issuer.id)),
            Some((true, Some(budget))) => {
                let child_budget = u8::try_from(budget - 1).unwrap_or(u8::MAX);
                Ok(match issuer.r#type {
                    CertificateType::RootCa => child_budget.min(self.default_path_length),
                    _ => child_budget,
                })
            }
            Some((true, None)) if issuer.r#type == CertificateType::RootCa => {
                Ok(self.default_path_length)
            }
            // intermediates without a pathLenConstraint grant no further budget
            Some((true, None)) => Err(ChainValidationError::IssuerPathLengthExhausted(issuer.id)),
        }
    }
}

impl ChainValidatorImpl {
    /// For every CA in the chain (leaf first), the number of intermediate CAs
    /// below it must not exceed its encoded pathLenConstraint
    fn validate_path_length(
        &self,
        chain: &[Certificate],
        certificates: &[x509_parser::prelude::X509Certificate],
    ) -> Result<(), ChainValidationError> {
        for (index, (member, certificate)) in chain.iter().zip(certificates).enumerate() {
            if !member.is_ca() {
                continue;
            }

            let Some((true, Some(constraint))) = basic_constraints(certificate) else {
                continue;
            };

            let intermediates = chain[..index]
                .iter()
                .filter(|below| below.r#type == CertificateType::IntermediateCa)
                .count();

            if intermediates > constraint as usize {
                return Err(ChainValidationError::PathLengthViolated {
                    id: member.id,
                    constraint,
                    intermediates,
                });
            }
        }
        Ok(())
    }
}
