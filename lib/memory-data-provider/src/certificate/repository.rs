use async_trait::async_trait;
use pki_core::model::certificate::{
    Certificate, CertificateListQuery, CertificateType, GetCertificateList,
    UpdateCertificateRequest,
};
use pki_core::repository::certificate_repository::CertificateRepository;
use pki_core::repository::error::DataLayerError;
use shared_types::{CertificateId, UserId};

use super::CertificateProvider;
use crate::common::paginate;

impl CertificateProvider {
    async fn filtered(
        &self,
        predicate: impl Fn(&Certificate) -> bool,
    ) -> Vec<Certificate> {
        self.certificates
            .read()
            .await
            .iter()
            .filter(|certificate| predicate(certificate))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CertificateRepository for CertificateProvider {
    async fn create(&self, request: Certificate) -> Result<CertificateId, DataLayerError> {
        let mut certificates = self.certificates.write().await;

        if certificates.iter().any(|certificate| {
            certificate.id == request.id || certificate.serial_number == request.serial_number
        }) {
            tracing::debug!(serial_number = request.serial_number, "duplicate certificate");
            return Err(DataLayerError::AlreadyExists);
        }

        let id = request.id;
        certificates.push(request);
        Ok(id)
    }

    async fn get(&self, id: CertificateId) -> Result<Option<Certificate>, DataLayerError> {
        Ok(self
            .certificates
            .read()
            .await
            .iter()
            .find(|certificate| certificate.id == id)
            .cloned())
    }

    async fn get_by_serial(
        &self,
        serial_number: &str,
    ) -> Result<Option<Certificate>, DataLayerError> {
        Ok(self
            .certificates
            .read()
            .await
            .iter()
            .find(|certificate| certificate.serial_number.eq_ignore_ascii_case(serial_number))
            .cloned())
    }

    async fn get_by_type(
        &self,
        certificate_type: CertificateType,
    ) -> Result<Vec<Certificate>, DataLayerError> {
        Ok(self
            .filtered(|certificate| certificate.r#type == certificate_type)
            .await)
    }

    async fn get_by_issuer(
        &self,
        issuer_id: CertificateId,
    ) -> Result<Vec<Certificate>, DataLayerError> {
        Ok(self
            .filtered(|certificate| certificate.issuer_id == Some(issuer_id))
            .await)
    }

    async fn list_by_organization(
        &self,
        organization: &str,
    ) -> Result<Vec<Certificate>, DataLayerError> {
        Ok(self
            .filtered(|certificate| certificate.organization.as_deref() == Some(organization))
            .await)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Certificate>, DataLayerError> {
        Ok(self
            .filtered(|certificate| certificate.owner_id == Some(owner_id))
            .await)
    }

    async fn list_with_private_key(&self) -> Result<Vec<Certificate>, DataLayerError> {
        Ok(self
            .filtered(|certificate| certificate.private_key.is_some())
            .await)
    }

    async fn update(
        &self,
        id: &CertificateId,
        request: UpdateCertificateRequest,
    ) -> Result<(), DataLayerError> {
        let mut certificates = self.certificates.write().await;
        let certificate = certificates
            .iter_mut()
            .find(|certificate| certificate.id == *id)
            .ok_or(DataLayerError::RecordNotUpdated)?;

        if let Some(state) = request.state {
            certificate.state = state;
        }
        if let Some(private_key) = request.private_key {
            certificate.private_key = Some(private_key);
        }
        certificate.last_modified = self.clock.now_utc();

        Ok(())
    }

    async fn search(
        &self,
        query: CertificateListQuery,
    ) -> Result<GetCertificateList, DataLayerError> {
        let mut values = self
            .filtered(|certificate| {
                query.state.is_none_or(|state| certificate.state == state)
                    && query
                        .r#type
                        .is_none_or(|certificate_type| certificate.r#type == certificate_type)
                    && query.organization.as_ref().is_none_or(|organization| {
                        certificate.organization.as_ref() == Some(organization)
                    })
            })
            .await;

        // newest first
        values.reverse();
        values.sort_by(|a, b| b.created_date.cmp(&a.created_date));

        Ok(paginate(values, query.pagination))
    }
}
