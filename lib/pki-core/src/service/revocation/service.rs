use std::str::FromStr;

use rcgen::{
    CertificateRevocationListParams, KeyIdMethod, RevokedCertParams, SerialNumber,
};
use shared_types::{CertificateId, RevocationId, UserId};
use time::Duration;

use super::dto::CertificateRevocationListDTO;
use super::{CRL_VALIDITY_DAYS, RevocationService};
use crate::model::certificate::{CertificateState, UpdateCertificateRequest};
use crate::model::revocation::{RevocationReason, RevokedCertificate};
use crate::proto::chain_validator::ChainValidationError;
use crate::repository::error::DataLayerError;
use crate::service::error::{
    BusinessLogicError, EntityNotFoundError, ServiceError, ValidationError,
};
use crate::util::x509::load_issuer;

impl RevocationService {
    /// One-way transition to `REVOKED`, recorded with reason and actor
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn revoke(
        &self,
        certificate_id: CertificateId,
        reason: &str,
        actor: UserId,
    ) -> Result<RevokedCertificate, ServiceError> {
        let reason = RevocationReason::from_str(reason.trim())
            .map_err(|_| ValidationError::InvalidReason(reason.to_owned()))?;

        let certificate = self
            .certificate_repository
            .get(certificate_id)
            .await?
            .ok_or(EntityNotFoundError::Certificate(certificate_id))?;

        if certificate.state == CertificateState::Revoked {
            return Err(BusinessLogicError::CertificateAlreadyRevoked(certificate_id).into());
        }
        if self
            .revocation_repository
            .get_by_certificate(certificate_id)
            .await?
            .is_some()
        {
            // record left without its state transition
            self.mark_revoked(certificate_id).await?;
            return Err(BusinessLogicError::CertificateAlreadyRevoked(certificate_id).into());
        }

        let record = RevokedCertificate {
            id: RevocationId::new_v4(),
            certificate_id,
            revoked_at: self.clock.now_utc(),
            reason,
            revoked_by: actor,
        };
        // the record is written first, a concurrent revocation loses here
        self.revocation_repository
            .create(record.clone())
            .await
            .map_err(|error| match error {
                DataLayerError::AlreadyExists => {
                    ServiceError::from(BusinessLogicError::CertificateAlreadyRevoked(certificate_id))
                }
                error => ServiceError::from(error),
            })?;
        self.mark_revoked(certificate_id).await?;

        tracing::info!(
            %certificate_id,
            certificate_type = %certificate.r#type,
            %reason,
            "certificate revoked"
        );
        self.audit.log(
            &format!("REVOKE_CERTIFICATE {certificate_id} {reason}"),
            &actor.to_string(),
        );
        Ok(record)
    }

    async fn mark_revoked(&self, certificate_id: CertificateId) -> Result<(), ServiceError> {
        self.certificate_repository
            .update(
                &certificate_id,
                UpdateCertificateRequest {
                    state: Some(CertificateState::Revoked),
                    ..Default::default()
                },
            )
            .await
            .inspect_err(|error| {
                tracing::error!(%certificate_id, %error, "revocation recorded but state not updated");
            })?;
        Ok(())
    }

    pub async fn list_revoked(&self) -> Result<Vec<RevokedCertificate>, ServiceError> {
        Ok(self.revocation_repository.list().await?)
    }

    /// CRL over every revoked certificate issued by `issuer_id`, signed with the issuer's custodied key
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn generate_crl(
        &self,
        issuer_id: CertificateId,
    ) -> Result<CertificateRevocationListDTO, ServiceError> {
        let issuer = self
            .certificate_repository
            .get(issuer_id)
            .await?
            .ok_or(EntityNotFoundError::Certificate(issuer_id))?;
        if !issuer.is_ca() {
            return Err(ChainValidationError::IssuerNotCA(issuer_id).into());
        }

        let mut revoked_certs = vec![];
        for certificate in self.certificate_repository.get_by_issuer(issuer_id).await? {
            if certificate.state != CertificateState::Revoked {
                continue;
            }

            let record = self
                .revocation_repository
                .get_by_certificate(certificate.id)
                .await?;
            let serial = hex::decode(&certificate.serial_number)
                .map_err(|err| ServiceError::CertificateParsing(err.to_string()))?;

            revoked_certs.push(RevokedCertParams {
                serial_number: SerialNumber::from_slice(&serial),
                revocation_time: record
                    .as_ref()
                    .map_or(certificate.last_modified, |record| record.revoked_at),
                reason_code: Some(revocation_reason(
                    record.map_or(RevocationReason::Unspecified, |record| record.reason),
                )),
                invalidity_date: None,
            });
        }

        let private_key = self.key_custodian.retrieve_custodied_key(&issuer).await?;
        let (issuer_certificate, issuer_key) =
            load_issuer(&issuer.certificate_pem, &private_key)?;

        let now = self.clock.now_utc();
        let this_update = now.replace_nanosecond(0).unwrap_or(now);
        let next_update = this_update + Duration::days(CRL_VALIDITY_DAYS);
        let revoked_count = revoked_certs.len();

        let crl_number = this_update.unix_timestamp().to_be_bytes();
        let crl_number = match crl_number.iter().position(|byte| *byte != 0) {
            Some(start) => &crl_number[start..],
            None => &crl_number[crl_number.len() - 1..],
        };

        let crl = CertificateRevocationListParams {
            this_update,
            next_update,
            crl_number: SerialNumber::from_slice(crl_number),
            issuing_distribution_point: None,
            revoked_certs,
            key_identifier_method: KeyIdMethod::Sha256,
        }
        .signed_by(&issuer_certificate, &issuer_key)?;

        tracing::debug!(%issuer_id, revoked_count, "CRL generated");
        Ok(CertificateRevocationListDTO {
            pem: crl.pem()?,
            this_update,
            next_update,
            revoked_count,
        })
    }
}

fn revocation_reason(reason: RevocationReason) -> rcgen::RevocationReason {
    match reason {
        RevocationReason::Unspecified => rcgen::RevocationReason::Unspecified,
        RevocationReason::KeyCompromise => rcgen::RevocationReason::KeyCompromise,
        RevocationReason::CaCompromise => rcgen::RevocationReason::CaCompromise,
        RevocationReason::AffiliationChanged => rcgen::RevocationReason::AffiliationChanged,
        RevocationReason::Superseded => rcgen::RevocationReason::Superseded,
        RevocationReason::CessationOfOperation => rcgen::RevocationReason::CessationOfOperation,
        RevocationReason::CertificateHold => rcgen::RevocationReason::CertificateHold,
        RevocationReason::RemoveFromCrl => rcgen::RevocationReason::RemoveFromCrl,
        RevocationReason::PrivilegeWithdrawn => rcgen::RevocationReason::PrivilegeWithdrawn,
        RevocationReason::AaCompromise => rcgen::RevocationReason::AaCompromise,
    }
}
