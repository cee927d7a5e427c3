use rcgen::{DistinguishedName, DnType, SubjectPublicKeyInfo};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use shared_types::{CertificateId, UserId};

use super::CertificateService;
use super::dto::{
    CertificateResponseDTO, GetCertificateListResponseDTO, IssueCertificateRequestDTO,
    IssueWithTemplateRequestDTO, RootCertificateRequestDTO, ServerCertificateRequestDTO,
};
use super::issuance::{
    IssuanceParams, Profile, SubjectKey, actor, ensure_ca, subject_alt_names,
};
use super::mapper::{certificate_list_response, certificate_page_response, certificate_response};
use crate::model::certificate::{Certificate, CertificateListQuery, CertificateType};
use crate::model::csr::CertificateSigningRequest;
use crate::proto::csr_verifier::CsrError;
use crate::service::error::{EntityNotFoundError, ServiceError};
use crate::util::x509::generate_key_pair;

/// Route taken by template-guided issuance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TemplateRoute {
    /// Decided by the CA basic-constraints requested in the CSR
    FromCsr,
    Intermediate,
    EndEntity,
}

impl CertificateService {
    /// Self-signed root with a custodied key
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_root(
        &self,
        request: RootCertificateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let now = self.now();
        let (not_before, not_after) = self.validity_window(
            now,
            request.ttl_days,
            self.config.root_ca.validity_days,
            None,
        )?;

        let organization = request
            .organization
            .or_else(|| self.config.root_ca.organization.clone());

        let mut subject = DistinguishedName::new();
        subject.push(
            DnType::CommonName,
            request
                .common_name
                .unwrap_or_else(|| self.config.root_ca.common_name.clone()),
        );
        if let Some(organization) = &organization {
            subject.push(DnType::OrganizationName, organization.as_str());
        }
        if let Some(country) = &self.config.root_ca.country {
            subject.push(DnType::CountryName, country.as_str());
        }

        let certificate = self
            .sign_and_persist(
                IssuanceParams {
                    subject,
                    subject_alt_names: vec![],
                    organization,
                    key: SubjectKey::Generated(generate_key_pair(self.config.key_algorithm)?),
                    profile: Profile::root(),
                    not_before,
                    not_after,
                    owner_id: request.owner_id,
                    template_id: None,
                },
                None,
            )
            .await?;

        tracing::info!(certificate_id = %certificate.id, "root certificate issued");
        self.audit.log(
            &format!("ISSUE_ROOT_CERTIFICATE {}", certificate.id),
            &actor(request.owner_id),
        );
        Ok(certificate_response(certificate, now))
    }

    /// CA certificate with a CA-generated key, the CSR key is only used as proof of possession
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_intermediate(
        &self,
        request: IssueCertificateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let issuer = self.get_issuer(request.issuer_id).await?;
        ensure_ca(&issuer)?;

        let csr = self.csr_verifier.verify(&request.csr)?;
        self.issue_intermediate_certificate(
            &issuer,
            CertificateSigningRequest {
                csr,
                requested_by: request.requested_by,
                ttl_days: request.ttl_days,
                applied_template: None,
            },
        )
        .await
    }

    /// Certificate over the requester's own public key, no key is custodied
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_end_entity(
        &self,
        request: IssueCertificateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let issuer = self.get_issuer(request.issuer_id).await?;
        ensure_ca(&issuer)?;

        let csr = self.csr_verifier.verify(&request.csr)?;
        self.issue_end_entity_certificate(
            &issuer,
            CertificateSigningRequest {
                csr,
                requested_by: request.requested_by,
                ttl_days: request.ttl_days,
                applied_template: None,
            },
        )
        .await
    }

    /// Server certificate issued on the requester's behalf, key generated and custodied by the CA
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_server_certificate(
        &self,
        request: ServerCertificateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let issuer = self.get_issuer(request.issuer_id).await?;
        ensure_ca(&issuer)?;

        let now = self.now();
        let (not_before, not_after) = self.validity_window(
            now,
            request.ttl_days,
            self.config.end_entity.validity_days,
            Some(&issuer),
        )?;
        self.chain_validator
            .validate_issuer_before_signing(&issuer, not_before, not_after)
            .await?;

        let mut subject = DistinguishedName::new();
        subject.push(DnType::CommonName, request.common_name.as_str());
        if let Some(organization) = &issuer.organization {
            subject.push(DnType::OrganizationName, organization.as_str());
        }

        let signer = self.load_signer(&issuer).await?;
        let certificate = self
            .sign_and_persist(
                IssuanceParams {
                    subject,
                    subject_alt_names: subject_alt_names(&request.subject_alt_names)?,
                    organization: issuer.organization.clone(),
                    key: SubjectKey::Generated(generate_key_pair(self.config.key_algorithm)?),
                    profile: Profile::server(),
                    not_before,
                    not_after,
                    owner_id: request.requested_by,
                    template_id: None,
                },
                Some(&signer),
            )
            .await?;

        tracing::info!(
            certificate_id = %certificate.id,
            issuer_id = %issuer.id,
            "server certificate issued"
        );
        self.audit.log(
            &format!("ISSUE_SERVER_CERTIFICATE {}", certificate.id),
            &actor(request.requested_by),
        );
        Ok(certificate_response(certificate, now))
    }

    /// Routes to intermediate issuance when the CSR requests CA basic-constraints
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_from_csr(
        &self,
        csr: &[u8],
        issuer_id: CertificateId,
        requested_by: Option<UserId>,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let csr = std::str::from_utf8(csr)
            .map_err(|err| CsrError::InvalidCsrFormat(err.to_string()))?;

        let issuer = self.get_issuer(issuer_id).await?;
        ensure_ca(&issuer)?;

        let csr = self.csr_verifier.verify(csr)?;
        let request = CertificateSigningRequest {
            csr,
            requested_by,
            ttl_days: None,
            applied_template: None,
        };

        if request.csr.requests_ca {
            self.issue_intermediate_certificate(&issuer, request).await
        } else {
            self.issue_end_entity_certificate(&issuer, request).await
        }
    }

    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_with_template(
        &self,
        request: IssueWithTemplateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        self.issue_templated(request, TemplateRoute::FromCsr).await
    }

    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_intermediate_with_template(
        &self,
        request: IssueWithTemplateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        self.issue_templated(request, TemplateRoute::Intermediate)
            .await
    }

    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn issue_end_entity_with_template(
        &self,
        request: IssueWithTemplateRequestDTO,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        self.issue_templated(request, TemplateRoute::EndEntity).await
    }

    pub async fn get_certificate(
        &self,
        id: CertificateId,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let certificate = self.get_certificate_record(id).await?;
        Ok(certificate_response(certificate, self.clock.now_utc()))
    }

    /// Ordered from the certificate itself up to its root
    pub async fn get_certificate_chain(
        &self,
        id: CertificateId,
    ) -> Result<Vec<CertificateResponseDTO>, ServiceError> {
        let certificate = self.get_certificate_record(id).await?;
        let chain = self.chain_validator.build_chain_to_root(&certificate).await?;
        Ok(certificate_list_response(chain, self.clock.now_utc()))
    }

    /// Builds the chain of a stored certificate and validates it up to the root
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn validate_certificate(&self, id: CertificateId) -> Result<(), ServiceError> {
        let certificate = self.get_certificate_record(id).await?;
        let chain = self.chain_validator.build_chain_to_root(&certificate).await?;
        self.chain_validator.validate_chain(&chain)?;
        Ok(())
    }

    pub async fn list_issued_by(
        &self,
        issuer_id: CertificateId,
    ) -> Result<Vec<CertificateResponseDTO>, ServiceError> {
        let certificates = self.certificate_repository.get_by_issuer(issuer_id).await?;
        Ok(certificate_list_response(certificates, self.clock.now_utc()))
    }

    pub async fn list_by_type(
        &self,
        certificate_type: CertificateType,
    ) -> Result<Vec<CertificateResponseDTO>, ServiceError> {
        let certificates = self
            .certificate_repository
            .get_by_type(certificate_type)
            .await?;
        Ok(certificate_list_response(certificates, self.clock.now_utc()))
    }

    pub async fn list_by_organization(
        &self,
        organization: &str,
    ) -> Result<Vec<CertificateResponseDTO>, ServiceError> {
        let certificates = self
            .certificate_repository
            .list_by_organization(organization)
            .await?;
        Ok(certificate_list_response(certificates, self.clock.now_utc()))
    }

    pub async fn list_by_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<CertificateResponseDTO>, ServiceError> {
        let certificates = self.certificate_repository.list_by_owner(owner_id).await?;
        Ok(certificate_list_response(certificates, self.clock.now_utc()))
    }

    pub async fn search(
        &self,
        query: CertificateListQuery,
    ) -> Result<GetCertificateListResponseDTO, ServiceError> {
        let page = self.certificate_repository.search(query).await?;
        Ok(certificate_page_response(page, self.clock.now_utc()))
    }

    /// Custodied private key followed by the chain, PEM encoded and sealed under `password`
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    pub async fn export_private_material(
        &self,
        id: CertificateId,
        password: SecretString,
    ) -> Result<Vec<u8>, ServiceError> {
        let certificate = self.get_certificate_record(id).await?;
        let private_key = self
            .key_custodian
            .retrieve_custodied_key(&certificate)
            .await?;
        let chain = self.chain_validator.build_chain_to_root(&certificate).await?;

        let mut bundle = private_key.expose_secret().trim_end().to_owned();
        for member in &chain {
            bundle.push('\n');
            bundle.push_str(member.certificate_pem.trim_end());
        }
        bundle.push('\n');

        let sealed = pki_crypto::encryption::encrypt_with_password(
            &password,
            &SecretSlice::from(bundle.into_bytes()),
        )?;

        self.audit.log(
            &format!("EXPORT_PRIVATE_MATERIAL {id}"),
            &actor(certificate.owner_id),
        );
        Ok(sealed)
    }
}

impl CertificateService {
    async fn get_certificate_record(&self, id: CertificateId) -> Result<Certificate, ServiceError> {
        self.certificate_repository
            .get(id)
            .await?
            .ok_or_else(|| EntityNotFoundError::Certificate(id).into())
    }

    async fn issue_templated(
        &self,
        request: IssueWithTemplateRequestDTO,
        route: TemplateRoute,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let template = self
            .template_repository
            .get(request.template_id)
            .await?
            .ok_or(EntityNotFoundError::Template(request.template_id))?;

        let csr = self.csr_verifier.verify(&request.csr)?;
        self.template_policy
            .check(&csr, &template, request.ttl_days)?;

        let mut signing_request = CertificateSigningRequest {
            csr,
            requested_by: request.requested_by,
            ttl_days: request.ttl_days,
            applied_template: None,
        };
        self.template_policy
            .apply_template(&mut signing_request, &template);

        let issuer = self.get_issuer(template.issuer_id).await?;
        ensure_ca(&issuer)?;

        let intermediate = match route {
            TemplateRoute::FromCsr => signing_request.csr.requests_ca,
            TemplateRoute::Intermediate => true,
            TemplateRoute::EndEntity => false,
        };
        if intermediate {
            self.issue_intermediate_certificate(&issuer, signing_request)
                .await
        } else {
            self.issue_end_entity_certificate(&issuer, signing_request)
                .await
        }
    }

    async fn issue_intermediate_certificate(
        &self,
        issuer: &Certificate,
        request: CertificateSigningRequest,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let now = self.now();
        let (not_before, not_after) = self.validity_window(
            now,
            request.ttl_days,
            self.config.intermediate_ca.validity_days,
            Some(issuer),
        )?;
        self.chain_validator
            .validate_issuer_before_signing(issuer, not_before, not_after)
            .await?;
        let path_length = self
            .chain_validator
            .calculate_path_length_for_new_ca(issuer)?;

        let signer = self.load_signer(issuer).await?;
        let certificate = self
            .sign_and_persist(
                IssuanceParams {
                    subject_alt_names: subject_alt_names(&request.csr.subject_alt_names)?,
                    subject: request.csr.subject_name,
                    organization: request.csr.organization.or(issuer.organization.clone()),
                    key: SubjectKey::Generated(generate_key_pair(self.config.key_algorithm)?),
                    profile: Profile::intermediate(path_length),
                    not_before,
                    not_after,
                    owner_id: request.requested_by,
                    template_id: request
                        .applied_template
                        .map(|template| template.template_id),
                },
                Some(&signer),
            )
            .await?;

        tracing::info!(
            certificate_id = %certificate.id,
            issuer_id = %issuer.id,
            path_length,
            "intermediate certificate issued"
        );
        self.audit.log(
            &format!("ISSUE_INTERMEDIATE_CERTIFICATE {}", certificate.id),
            &actor(request.requested_by),
        );
        Ok(certificate_response(certificate, now))
    }

    async fn issue_end_entity_certificate(
        &self,
        issuer: &Certificate,
        request: CertificateSigningRequest,
    ) -> Result<CertificateResponseDTO, ServiceError> {
        let now = self.now();
        let (not_before, not_after) = self.validity_window(
            now,
            request.ttl_days,
            self.config.end_entity.validity_days,
            Some(issuer),
        )?;
        self.chain_validator
            .validate_issuer_before_signing(issuer, not_before, not_after)
            .await?;

        let public_key = SubjectPublicKeyInfo::from_der(&request.csr.public_key)?;
        let profile = Profile::end_entity(request.applied_template.as_ref());

        let signer = self.load_signer(issuer).await?;
        let certificate = self
            .sign_and_persist(
                IssuanceParams {
                    subject_alt_names: subject_alt_names(&request.csr.subject_alt_names)?,
                    subject: request.csr.subject_name,
                    organization: request.csr.organization.or(issuer.organization.clone()),
                    key: SubjectKey::External(public_key),
                    profile,
                    not_before,
                    not_after,
                    owner_id: request.requested_by,
                    template_id: request
                        .applied_template
                        .map(|template| template.template_id),
                },
                Some(&signer),
            )
            .await?;

        tracing::info!(
            certificate_id = %certificate.id,
            issuer_id = %issuer.id,
            "end-entity certificate issued"
        );
        self.audit.log(
            &format!("ISSUE_END_ENTITY_CERTIFICATE {}", certificate.id),
            &actor(request.requested_by),
        );
        Ok(certificate_response(certificate, now))
    }
}
