use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose, SanType, SerialNumber, SubjectPublicKeyInfo,
};
use secrecy::SecretString;
use shared_types::{CertificateId, TemplateId, UserId};
use time::{Duration, OffsetDateTime};

use super::CertificateService;
use crate::model::certificate::{Certificate, CertificateState, CertificateType};
use crate::model::csr::AppliedTemplate;
use crate::proto::chain_validator::ChainValidationError;
use crate::provider::audit::SYSTEM_ACTOR;
use crate::repository::error::DataLayerError;
use crate::service::error::{BusinessLogicError, ServiceError, ValidationError};
use crate::util::x509::{
    certificate_details, extended_key_usage_purpose, key_usage_purpose, load_issuer,
    to_san_type,
};

pub(super) enum SubjectKey {
    /// Generated by the CA, the private half is custodied
    Generated(KeyPair),
    /// Held by the requester, taken from the CSR
    External(SubjectPublicKeyInfo),
}

pub(super) struct Profile {
    pub r#type: CertificateType,
    pub is_ca: IsCa,
    pub key_usages: Vec<KeyUsagePurpose>,
    pub extended_key_usages: Vec<ExtendedKeyUsagePurpose>,
}

impl Profile {
    pub fn root() -> Self {
        Self {
            r#type: CertificateType::RootCa,
            is_ca: IsCa::Ca(BasicConstraints::Unconstrained),
            key_usages: vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign],
            extended_key_usages: vec![],
        }
    }

    pub fn intermediate(path_length: u8) -> Self {
        Self {
            r#type: CertificateType::IntermediateCa,
            is_ca: IsCa::Ca(BasicConstraints::Constrained(path_length)),
            key_usages: vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign],
            extended_key_usages: vec![],
        }
    }

    /// Template defaults replace the built-in usages when present
    pub fn end_entity(applied_template: Option<&AppliedTemplate>) -> Self {
        let mut key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::DataEncipherment,
        ];
        let mut extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ClientAuth,
            ExtendedKeyUsagePurpose::ServerAuth,
        ];

        if let Some(template) = applied_template {
            if !template.key_usage.is_empty() {
                key_usages = template
                    .key_usage
                    .iter()
                    .copied()
                    .map(key_usage_purpose)
                    .collect();
            }
            if !template.extended_key_usage.is_empty() {
                extended_key_usages = template
                    .extended_key_usage
                    .iter()
                    .copied()
                    .map(extended_key_usage_purpose)
                    .collect();
            }
        }

        Self {
            r#type: CertificateType::EndEntity,
            is_ca: IsCa::ExplicitNoCa,
            key_usages,
            extended_key_usages,
        }
    }

    pub fn server() -> Self {
        Self {
            r#type: CertificateType::EndEntity,
            is_ca: IsCa::ExplicitNoCa,
            key_usages: vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyEncipherment,
            ],
            extended_key_usages: vec![ExtendedKeyUsagePurpose::ServerAuth],
        }
    }
}

pub(super) struct IssuanceParams {
    pub subject: DistinguishedName,
    pub subject_alt_names: Vec<SanType>,
    pub organization: Option<String>,
    pub key: SubjectKey,
    pub profile: Profile,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub owner_id: Option<UserId>,
    pub template_id: Option<TemplateId>,
}

/// Signing material of an issuer, rebuilt from its record and custodied key
pub(super) struct Signer<'a> {
    pub record: &'a Certificate,
    pub certificate: rcgen::Certificate,
    pub key: KeyPair,
}

pub(super) fn actor(user: Option<UserId>) -> String {
    user.map(|user| user.to_string())
        .unwrap_or_else(|| SYSTEM_ACTOR.to_string())
}

pub(super) fn subject_alt_names(values: &[String]) -> Result<Vec<SanType>, ServiceError> {
    values
        .iter()
        .map(|value| {
            to_san_type(value)
                .map_err(|err| ValidationError::InvalidRequest(err.to_string()).into())
        })
        .collect()
}

pub(super) fn ensure_ca(issuer: &Certificate) -> Result<(), ServiceError> {
    if !issuer.is_ca() {
        return Err(ChainValidationError::IssuerNotCA(issuer.id).into());
    }
    Ok(())
}

impl CertificateService {
    /// Second precision, as encoded in the certificate
    pub(super) fn now(&self) -> OffsetDateTime {
        let now = self.clock.now_utc();
        now.replace_nanosecond(0).unwrap_or(now)
    }

    /// Explicit TTLs are taken as requested and checked against the issuer
    /// window later, profile defaults are truncated to the issuer's `valid_to`
    pub(super) fn validity_window(
        &self,
        now: OffsetDateTime,
        ttl_days: Option<u32>,
        default_days: u32,
        issuer: Option<&Certificate>,
    ) -> Result<(OffsetDateTime, OffsetDateTime), ServiceError> {
        // beyond the representable date range
        let add_days = |days: u32| {
            now.checked_add(Duration::days(days.into()))
                .ok_or(ValidationError::InvalidTtl)
        };

        let not_after = match ttl_days {
            Some(0) => return Err(ValidationError::InvalidTtl.into()),
            Some(days) => add_days(days)?,
            None => {
                let not_after = add_days(default_days)?;
                match issuer {
                    Some(issuer) => not_after.min(issuer.valid_to),
                    None => not_after,
                }
            }
        };
        Ok((now, not_after))
    }

    pub(super) async fn get_issuer(
        &self,
        issuer_id: CertificateId,
    ) -> Result<Certificate, ServiceError> {
        self.certificate_repository
            .get(issuer_id)
            .await?
            .ok_or_else(|| ChainValidationError::IssuerNotFound(issuer_id).into())
    }

    pub(super) async fn load_signer<'a>(
        &self,
        issuer: &'a Certificate,
    ) -> Result<Signer<'a>, ServiceError> {
        let private_key = self.key_custodian.retrieve_custodied_key(issuer).await?;
        let (certificate, key) = load_issuer(&issuer.certificate_pem, &private_key)?;
        Ok(Signer {
            record: issuer,
            certificate,
            key,
        })
    }

    fn generate_serial(&self) -> Vec<u8> {
        let mut serial =
            pki_crypto::utilities::generate_random_vec(self.config.issuance.serial_number_length);
        // positive and without a leading zero octet
        if let Some(first) = serial.first_mut() {
            *first = (*first & 0x7f) | 0x01;
        }
        serial
    }

    /// Signs under a fresh serial and persists the record together with the
    /// custodied key, retrying when the serial is already taken
    pub(super) async fn sign_and_persist(
        &self,
        params: IssuanceParams,
        signer: Option<&Signer<'_>>,
    ) -> Result<Certificate, ServiceError> {
        let master_key = match params.key {
            SubjectKey::Generated(_) => Some(self.key_custodian.get_current_master_key().await?),
            SubjectKey::External(_) => None,
        };

        let attempts = self.config.issuance.serial_retry_attempts;
        for attempt in 1..=attempts {
            let serial = self.generate_serial();
            if self
                .certificate_repository
                .get_by_serial(&hex::encode(&serial))
                .await?
                .is_some()
            {
                tracing::warn!(attempt, "serial number collision, retrying");
                continue;
            }

            let mut certificate_params = CertificateParams::default();
            certificate_params.distinguished_name = params.subject.clone();
            certificate_params.subject_alt_names = params.subject_alt_names.clone();
            certificate_params.serial_number = Some(SerialNumber::from_slice(&serial));
            certificate_params.not_before = params.not_before;
            certificate_params.not_after = params.not_after;
            certificate_params.is_ca = params.profile.is_ca.clone();
            certificate_params.key_usages = params.profile.key_usages.clone();
            certificate_params.extended_key_usages = params.profile.extended_key_usages.clone();
            certificate_params.use_authority_key_identifier_extension = signer.is_some();

            let certificate = match (&params.key, signer) {
                (SubjectKey::Generated(key), None) => certificate_params.self_signed(key)?,
                (SubjectKey::Generated(key), Some(signer)) => {
                    certificate_params.signed_by(key, &signer.certificate, &signer.key)?
                }
                (SubjectKey::External(public_key), Some(signer)) => {
                    certificate_params.signed_by(public_key, &signer.certificate, &signer.key)?
                }
                (SubjectKey::External(_), None) => {
                    return Err(ValidationError::InvalidRequest(
                        "self-signed certificate requires a generated key".to_string(),
                    )
                    .into());
                }
            };

            let pem = certificate.pem();
            let details = certificate_details(&pem)
                .map_err(|err| ServiceError::CertificateParsing(err.to_string()))?;
            let now = self.clock.now_utc();

            let mut record = Certificate {
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
                r#type: params.profile.r#type,
                state: CertificateState::Active,
                organization: params.organization.clone(),
                issuer_id: signer.map(|signer| signer.record.id),
                owner_id: params.owner_id,
                template_id: params.template_id,
            };

            if let (SubjectKey::Generated(key), Some(master_key)) = (&params.key, &master_key) {
                self.key_custodian.store_private_key(
                    &mut record,
                    &SecretString::from(key.serialize_pem()),
                    master_key,
                )?;
            }

            match self.certificate_repository.create(record.clone()).await {
                Ok(_) => return Ok(record),
                Err(DataLayerError::AlreadyExists) => {
                    tracing::warn!(attempt, "certificate rejected by store as duplicate, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(BusinessLogicError::SerialCollision { attempts }.into())
    }
}
