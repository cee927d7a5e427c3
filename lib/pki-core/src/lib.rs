#![cfg_attr(feature = "strict", deny(warnings))]

use std::sync::Arc;

use config::ConfigValidationError;
use config::core_config::{CoreConfig, MasterKeyStorageType};
use proto::chain_validator::ChainValidatorImpl;
use proto::clock::{Clock, DefaultClock};
use proto::csr_verifier::CsrVerifierImpl;
use proto::key_custodian::KeyCustodianImpl;
use proto::template_policy::TemplatePolicyImpl;
use provider::audit::AuditSink;
use provider::audit::tracing_sink::TracingAuditSink;
use provider::master_key_storage::MasterKeyStorage;
use provider::master_key_storage::file::FileMasterKeyStorage;
use provider::master_key_storage::in_memory::InMemoryMasterKeyStorage;
use repository::DataRepository;
use service::certificate::CertificateService;
use service::master_key::MasterKeyService;
use service::revocation::RevocationService;
use service::template::TemplateService;

pub mod config;
pub mod error;
pub mod model;
pub mod proto;
pub mod provider;
pub mod repository;
pub mod service;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utilities;

/// Replacements for the providers otherwise derived from the config
#[derive(Default)]
pub struct PkiCoreProviders {
    pub master_key_storage: Option<Arc<dyn MasterKeyStorage>>,
    pub audit: Option<Arc<dyn AuditSink>>,
    pub clock: Option<Arc<dyn Clock>>,
}

#[derive(Clone)]
pub struct PkiCore {
    pub certificate_service: CertificateService,
    pub revocation_service: RevocationService,
    pub template_service: TemplateService,
    pub master_key_service: MasterKeyService,
}

impl PkiCore {
    pub fn new(
        config: CoreConfig,
        data_repository: Arc<dyn DataRepository>,
    ) -> Result<Self, ConfigValidationError> {
        Self::with_providers(config, data_repository, PkiCoreProviders::default())
    }

    pub fn with_providers(
        config: CoreConfig,
        data_repository: Arc<dyn DataRepository>,
        providers: PkiCoreProviders,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;

        let master_key_storage = match providers.master_key_storage {
            Some(storage) => storage,
            None => master_key_storage(&config)?,
        };
        let audit = providers
            .audit
            .unwrap_or_else(|| Arc::new(TracingAuditSink));
        let clock = providers.clock.unwrap_or_else(|| Arc::new(DefaultClock));

        let certificate_repository = data_repository.get_certificate_repository();
        let template_repository = data_repository.get_template_repository();
        let revocation_repository = data_repository.get_revocation_repository();

        let chain_validator = Arc::new(ChainValidatorImpl::new(
            certificate_repository.clone(),
            clock.clone(),
            config.intermediate_ca.default_path_length,
        ));
        let key_custodian = Arc::new(KeyCustodianImpl::new(
            master_key_storage,
            certificate_repository.clone(),
        ));

        tracing::debug!(
            key_algorithm = %config.key_algorithm,
            master_key_storage = %config.master_key.storage,
            "PKI core initialized"
        );

        Ok(Self {
            revocation_service: RevocationService::new(
                certificate_repository.clone(),
                revocation_repository,
                key_custodian.clone(),
                audit.clone(),
                clock.clone(),
            ),
            template_service: TemplateService::new(
                template_repository.clone(),
                certificate_repository.clone(),
                audit.clone(),
                clock.clone(),
            ),
            master_key_service: MasterKeyService::new(key_custodian.clone(), audit.clone()),
            certificate_service: CertificateService::new(
                certificate_repository,
                template_repository,
                chain_validator,
                key_custodian,
                Arc::new(CsrVerifierImpl),
                Arc::new(TemplatePolicyImpl),
                audit,
                clock,
                Arc::new(config),
            ),
        })
    }
}

fn master_key_storage(
    config: &CoreConfig,
) -> Result<Arc<dyn MasterKeyStorage>, ConfigValidationError> {
    Ok(match config.master_key.storage {
        MasterKeyStorageType::Memory => Arc::new(InMemoryMasterKeyStorage::new()),
        MasterKeyStorageType::File => {
            let directory = config.master_key.directory.clone().ok_or_else(|| {
                ConfigValidationError::MissingMasterKeyDirectory(
                    config.master_key.storage.to_string(),
                )
            })?;
            Arc::new(FileMasterKeyStorage::new(directory))
        }
    })
}
