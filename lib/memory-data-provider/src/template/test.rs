use pki_core::model::template::{CertificateTemplate, ExtendedKeyUsage};
use pki_core::repository::error::DataLayerError;
use pki_core::repository::template_repository::TemplateRepository;
use shared_types::{CertificateId, TemplateId};
use time::OffsetDateTime;

use super::TemplateProvider;

fn dummy_template(issuer_id: CertificateId) -> CertificateTemplate {
    let now = OffsetDateTime::now_utc();
    CertificateTemplate {
        id: TemplateId::new_v4(),
        created_date: now,
        last_modified: now,
        name: "web".to_string(),
        issuer_id,
        cn_regex: Some("web-.*".to_string()),
        san_regex: None,
        max_ttl_days: Some(90),
        key_usage: vec![],
        extended_key_usage: vec![ExtendedKeyUsage::ServerAuth],
        owner_id: None,
    }
}

#[tokio::test]
async fn test_template_lifecycle() {
    let provider = TemplateProvider::default();
    let issuer = CertificateId::new_v4();
    let template = dummy_template(issuer);
    let other = dummy_template(CertificateId::new_v4());

    provider.create(template.clone()).await.unwrap();
    provider.create(other.clone()).await.unwrap();
    assert!(matches!(
        provider.create(template.clone()).await,
        Err(DataLayerError::AlreadyExists)
    ));

    assert_eq!(provider.get(template.id).await.unwrap(), Some(template.clone()));
    assert_eq!(provider.list(None).await.unwrap().len(), 2);
    assert_eq!(provider.list(Some(issuer)).await.unwrap(), vec![template.clone()]);

    provider.delete(template.id).await.unwrap();
    assert_eq!(provider.get(template.id).await.unwrap(), None);
    assert!(matches!(
        provider.delete(template.id).await,
        Err(DataLayerError::RecordNotUpdated)
    ));
}
