use std::sync::Arc;

use mockall::predicate::eq;
use shared_types::UserId;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::FromDer;
use x509_parser::revocation_list::CertificateRevocationList;

use super::RevocationService;
use crate::error::{ErrorCode, ErrorCodeMixin};
use crate::model::certificate::{Certificate, CertificateState};
use crate::model::revocation::{RevocationReason, RevokedCertificate};
use crate::proto::clock::DefaultClock;
use crate::proto::key_custodian::KeyCustodianImpl;
use crate::provider::audit::MockAuditSink;
use crate::provider::master_key_storage::in_memory::InMemoryMasterKeyStorage;
use crate::repository::certificate_repository::MockCertificateRepository;
use crate::repository::error::DataLayerError;
use crate::repository::revocation_repository::MockRevocationRepository;
use crate::service::error::{
    BusinessLogicError, EntityNotFoundError, ServiceError, ValidationError,
};
use crate::test_utilities::{custodied, end_entity_certificate, now, root_certificate};

fn key_custodian() -> Arc<KeyCustodianImpl> {
    Arc::new(KeyCustodianImpl::new(
        Arc::new(InMemoryMasterKeyStorage::new()),
        Arc::new(MockCertificateRepository::default()),
    ))
}

fn setup_service(
    certificate_repository: MockCertificateRepository,
    revocation_repository: MockRevocationRepository,
    key_custodian: Arc<KeyCustodianImpl>,
    audit: MockAuditSink,
) -> RevocationService {
    RevocationService::new(
        Arc::new(certificate_repository),
        Arc::new(revocation_repository),
        key_custodian,
        Arc::new(audit),
        Arc::new(DefaultClock),
    )
}

#[tokio::test]
async fn test_revoke_certificate() {
    let root = root_certificate();
    let leaf = end_entity_certificate(&root);
    let id = leaf.model.id;
    let actor = UserId::new_v4();

    let mut certificate_repository = MockCertificateRepository::default();
    {
        let leaf = leaf.model.clone();
        certificate_repository
            .expect_get()
            .with(eq(id))
            .returning(move |_| Ok(Some(leaf.clone())));
    }
    certificate_repository
        .expect_update()
        .once()
        .withf(move |certificate_id, request| {
            *certificate_id == id
                && request.state == Some(CertificateState::Revoked)
                && request.private_key.is_none()
        })
        .returning(|_, _| Ok(()));

    let mut revocation_repository = MockRevocationRepository::default();
    revocation_repository
        .expect_get_by_certificate()
        .returning(|_| Ok(None));
    revocation_repository
        .expect_create()
        .once()
        .withf(move |record| {
            record.certificate_id == id
                && record.reason == RevocationReason::KeyCompromise
                && record.revoked_by == actor
        })
        .returning(|record| Ok(record.id));

    let mut audit = MockAuditSink::default();
    audit
        .expect_log()
        .withf(move |action, who| {
            action == format!("REVOKE_CERTIFICATE {id} KEY_COMPROMISE") && who == actor.to_string()
        })
        .once()
        .return_const(());

    let service = setup_service(
        certificate_repository,
        revocation_repository,
        key_custodian(),
        audit,
    );
    let record = service.revoke(id, "key_compromise", actor).await.unwrap();
    assert_eq!(record.reason, RevocationReason::KeyCompromise);
    assert_eq!(record.certificate_id, id);
}

#[tokio::test]
async fn test_revoke_invalid_reason() {
    let service = setup_service(
        MockCertificateRepository::default(),
        MockRevocationRepository::default(),
        key_custodian(),
        MockAuditSink::default(),
    );

    let error = service
        .revoke(root_certificate().model.id, "lost my laptop", UserId::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ServiceError::Validation(ValidationError::InvalidReason(_))
    ));
    assert_eq!(error.error_code(), ErrorCode::BR_0062);
}

#[tokio::test]
async fn test_revoke_missing_certificate() {
    let mut certificate_repository = MockCertificateRepository::default();
    certificate_repository.expect_get().returning(|_| Ok(None));

    let service = setup_service(
        certificate_repository,
        MockRevocationRepository::default(),
        key_custodian(),
        MockAuditSink::default(),
    );

    let error = service
        .revoke(root_certificate().model.id, "SUPERSEDED", UserId::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ServiceError::EntityNotFound(EntityNotFoundError::Certificate(_))
    ));
    assert_eq!(error.error_code(), ErrorCode::BR_0001);
}

#[tokio::test]
async fn test_revoke_twice() {
    let mut revoked = root_certificate().model;
    revoked.state = CertificateState::Revoked;

    let mut certificate_repository = MockCertificateRepository::default();
    {
        let revoked = revoked.clone();
        certificate_repository
            .expect_get()
            .returning(move |_| Ok(Some(revoked.clone())));
    }
    certificate_repository.expect_update().never();

    let service = setup_service(
        certificate_repository,
        MockRevocationRepository::default(),
        key_custodian(),
        MockAuditSink::default(),
    );

    let result = service.revoke(revoked.id, "superseded", UserId::new_v4()).await;
    assert!(matches!(
        result,
        Err(ServiceError::BusinessLogic(BusinessLogicError::CertificateAlreadyRevoked(id))) if id == revoked.id
    ));
}

fn active_certificate_repository(certificate: Certificate) -> MockCertificateRepository {
    let mut certificate_repository = MockCertificateRepository::default();
    certificate_repository
        .expect_get()
        .with(eq(certificate.id))
        .returning(move |_| Ok(Some(certificate.clone())));
    certificate_repository
}

#[tokio::test]
async fn test_revoke_keeps_state_when_record_not_stored() {
    let leaf = end_entity_certificate(&root_certificate()).model;

    let mut certificate_repository = active_certificate_repository(leaf.clone());
    certificate_repository.expect_update().never();

    let mut revocation_repository = MockRevocationRepository::default();
    revocation_repository
        .expect_get_by_certificate()
        .returning(|_| Ok(None));
    revocation_repository
        .expect_create()
        .once()
        .returning(|_| Err(DataLayerError::Db(anyhow::anyhow!("connection lost"))));

    let service = setup_service(
        certificate_repository,
        revocation_repository,
        key_custodian(),
        MockAuditSink::default(),
    );

    let error = service
        .revoke(leaf.id, "superseded", UserId::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::Repository(DataLayerError::Db(_))));
    assert_eq!(error.error_code(), ErrorCode::BR_0003);
}

#[tokio::test]
async fn test_concurrent_revocation_reported_as_already_revoked() {
    let leaf = end_entity_certificate(&root_certificate()).model;

    let mut certificate_repository = active_certificate_repository(leaf.clone());
    certificate_repository.expect_update().never();

    let mut revocation_repository = MockRevocationRepository::default();
    revocation_repository
        .expect_get_by_certificate()
        .returning(|_| Ok(None));
    revocation_repository
        .expect_create()
        .once()
        .returning(|_| Err(DataLayerError::AlreadyExists));

    let service = setup_service(
        certificate_repository,
        revocation_repository,
        key_custodian(),
        MockAuditSink::default(),
    );

    let error = service
        .revoke(leaf.id, "superseded", UserId::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ServiceError::BusinessLogic(BusinessLogicError::CertificateAlreadyRevoked(id)) if id == leaf.id
    ));
    assert_eq!(error.error_code(), ErrorCode::BR_0061);
}

#[tokio::test]
async fn test_revoke_completes_interrupted_revocation() {
    let leaf = end_entity_certificate(&root_certificate()).model;
    let id = leaf.id;
    let record = RevokedCertificate {
        id: shared_types::RevocationId::new_v4(),
        certificate_id: id,
        revoked_at: now(),
        reason: RevocationReason::Superseded,
        revoked_by: UserId::new_v4(),
    };

    let mut certificate_repository = active_certificate_repository(leaf);
    certificate_repository
        .expect_update()
        .once()
        .withf(move |certificate_id, request| {
            *certificate_id == id && request.state == Some(CertificateState::Revoked)
        })
        .returning(|_, _| Ok(()));

    let mut revocation_repository = MockRevocationRepository::default();
    revocation_repository
        .expect_get_by_certificate()
        .returning(move |_| Ok(Some(record.clone())));
    revocation_repository.expect_create().never();

    let service = setup_service(
        certificate_repository,
        revocation_repository,
        key_custodian(),
        MockAuditSink::default(),
    );

    let error = service
        .revoke(id, "key_compromise", UserId::new_v4())
        .await
        .unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::BR_0061);
}

#[tokio::test]
async fn test_generate_crl() {
    let custodian = key_custodian();
    let root = root_certificate();
    let root_model = custodied(&root, custodian.as_ref()).await;

    let mut revoked = end_entity_certificate(&root).model;
    revoked.state = CertificateState::Revoked;
    let active = end_entity_certificate(&root).model;
    let record = RevokedCertificate {
        id: shared_types::RevocationId::new_v4(),
        certificate_id: revoked.id,
        revoked_at: now(),
        reason: RevocationReason::KeyCompromise,
        revoked_by: UserId::new_v4(),
    };

    let mut certificate_repository = MockCertificateRepository::default();
    {
        let root_model = root_model.clone();
        certificate_repository
            .expect_get()
            .with(eq(root_model.id))
            .returning(move |_| Ok(Some(root_model.clone())));
    }
    {
        let issued = vec![revoked.clone(), active];
        certificate_repository
            .expect_get_by_issuer()
            .with(eq(root_model.id))
            .returning(move |_| Ok(issued.clone()));
    }

    let mut revocation_repository = MockRevocationRepository::default();
    revocation_repository
        .expect_get_by_certificate()
        .with(eq(revoked.id))
        .returning(move |_| Ok(Some(record.clone())));

    let service = setup_service(
        certificate_repository,
        revocation_repository,
        custodian,
        MockAuditSink::default(),
    );
    let crl = service.generate_crl(root_model.id).await.unwrap();
    assert_eq!(crl.revoked_count, 1);

    let (_, pem) = parse_x509_pem(crl.pem.as_bytes()).unwrap();
    assert_eq!(pem.label, "X509 CRL");
    let (_, parsed) = CertificateRevocationList::from_der(&pem.contents).unwrap();

    let serials: Vec<String> = parsed
        .iter_revoked_certificates()
        .map(|entry| hex::encode(entry.raw_serial()))
        .collect();
    assert_eq!(serials, vec![revoked.serial_number.clone()]);
    assert_eq!(parsed.issuer().to_string(), root_model.subject);
}

#[tokio::test]
async fn test_generate_crl_requires_ca() {
    let root = root_certificate();
    let leaf = end_entity_certificate(&root).model;

    let mut certificate_repository = MockCertificateRepository::default();
    {
        let leaf = leaf.clone();
        certificate_repository
            .expect_get()
            .returning(move |_| Ok(Some(leaf.clone())));
    }

    let service = setup_service(
        certificate_repository,
        MockRevocationRepository::default(),
        key_custodian(),
        MockAuditSink::default(),
    );
    let error = service.generate_crl(leaf.id).await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::BR_0011);
}
