use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "config_env")]
use figment::providers::Env;
#[cfg(feature = "config_json")]
use figment::providers::Json;
#[cfg(feature = "config_yaml")]
use figment::providers::Yaml;
use figment::providers::{Data, Format};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use strum::{Display, EnumString};

use super::{ConfigParsingError, ConfigValidationError};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub key_algorithm: KeyAlgorithmType,
    pub root_ca: RootCaConfig,
    pub intermediate_ca: IntermediateCaConfig,
    pub end_entity: EndEntityConfig,
    pub issuance: IssuanceConfig,
    pub master_key: MasterKeyConfig,
}

#[derive(
    Debug, Default, Copy, Clone, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum KeyAlgorithmType {
    #[default]
    #[serde(rename = "ECDSA_P256")]
    #[strum(serialize = "ECDSA_P256")]
    EcdsaP256,
    #[serde(rename = "ECDSA_P384")]
    #[strum(serialize = "ECDSA_P384")]
    EcdsaP384,
    #[serde(rename = "EDDSA")]
    #[strum(serialize = "EDDSA")]
    Eddsa,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootCaConfig {
    pub common_name: String,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub validity_days: u32,
}

impl Default for RootCaConfig {
    fn default() -> Self {
        Self {
            common_name: "PKI Root CA".to_string(),
            organization: None,
            country: None,
            validity_days: 3650,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntermediateCaConfig {
    pub validity_days: u32,
    /// Path length budget granted to intermediates issued directly by a root
    pub default_path_length: u8,
}

impl Default for IntermediateCaConfig {
    fn default() -> Self {
        Self {
            validity_days: 1825,
            default_path_length: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndEntityConfig {
    pub validity_days: u32,
}

impl Default for EndEntityConfig {
    fn default() -> Self {
        Self { validity_days: 365 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuanceConfig {
    pub serial_retry_attempts: u32,
    /// Serial number width in bytes
    pub serial_number_length: usize,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            serial_retry_attempts: 5,
            serial_number_length: 16,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MasterKeyStorageType {
    File,
    #[default]
    Memory,
}

#[skip_serializing_none]
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterKeyConfig {
    pub storage: MasterKeyStorageType,
    pub directory: Option<PathBuf>,
}

pub enum InputFormat {
    #[cfg(feature = "config_yaml")]
    Yaml(Data<Yaml>),
    #[cfg(feature = "config_json")]
    Json(Data<Json>),
}

impl InputFormat {
    #[cfg(feature = "config_yaml")]
    pub fn yaml_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Yaml(Yaml::file(p))
    }

    #[cfg(feature = "config_yaml")]
    pub fn yaml_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Yaml(Yaml::string(s.as_ref()))
    }

    #[cfg(feature = "config_json")]
    pub fn json_file(p: impl AsRef<Path>) -> InputFormat {
        InputFormat::Json(Json::file(p))
    }

    #[cfg(feature = "config_json")]
    pub fn json_str(s: impl AsRef<str>) -> InputFormat {
        InputFormat::Json(Json::string(s.as_ref()))
    }
}

impl CoreConfig {
    pub fn from_files(files: &[impl AsRef<Path>]) -> Result<Self, ConfigParsingError> {
        let mut inputs: Vec<InputFormat> = Vec::with_capacity(files.len());

        for path in files {
            #[cfg(feature = "config_yaml")]
            if path
                .as_ref()
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
            {
                inputs.push(InputFormat::yaml_file(path));
                continue;
            }

            #[cfg(feature = "config_json")]
            if path.as_ref().extension() == Some("json".as_ref()) {
                inputs.push(InputFormat::json_file(path));
                continue;
            }

            return Err(ConfigParsingError::GeneralParsingError(format!(
                "Unsupported file or missing file extension: {:?}",
                path.as_ref().to_str()
            )));
        }

        CoreConfig::parse(inputs)
    }

    #[cfg(feature = "config_yaml")]
    pub fn from_yaml(
        configs: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ConfigParsingError> {
        let inputs = configs.into_iter().map(InputFormat::yaml_str);

        CoreConfig::parse(inputs)
    }

    pub fn parse(
        inputs: impl IntoIterator<Item = InputFormat>,
    ) -> Result<Self, ConfigParsingError> {
        let mut figment = Figment::new();

        for data in inputs {
            figment = match data {
                #[cfg(feature = "config_yaml")]
                InputFormat::Yaml(content) => figment.merge(content),
                #[cfg(feature = "config_json")]
                InputFormat::Json(content) => figment.merge(content),
            };
        }

        #[cfg(feature = "config_env")]
        {
            figment = figment.merge(Env::prefixed("PKI_").split("__").lowercase(false));
        }

        let config = figment
            .extract::<CoreConfig>()
            .map_err(|e| ConfigParsingError::GeneralParsingError(e.to_string()))?;

        config
            .validate()
            .map_err(|e| ConfigParsingError::GeneralParsingError(e.to_string()))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.master_key.storage == MasterKeyStorageType::File && self.master_key.directory.is_none()
        {
            return Err(ConfigValidationError::MissingMasterKeyDirectory(
                self.master_key.storage.to_string(),
            ));
        }

        if self.issuance.serial_number_length == 0 || self.issuance.serial_number_length > 20 {
            return Err(ConfigValidationError::InvalidValue {
                field: "issuance.serialNumberLength",
                reason: "must be between 1 and 20 bytes".to_string(),
            });
        }

        if self.issuance.serial_retry_attempts == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "issuance.serialRetryAttempts",
                reason: "must be at least 1".to_string(),
            });
        }

        for (field, days) in [
            ("rootCa.validityDays", self.root_ca.validity_days),
            ("intermediateCa.validityDays", self.intermediate_ca.validity_days),
            ("endEntity.validityDays", self.end_entity.validity_days),
        ] {
            if days == 0 {
                return Err(ConfigValidationError::InvalidValue {
                    field,
                    reason: "must be at least one day".to_string(),
                });
            }
        }

        Ok(())
    }
}
