use std::path::PathBuf;

use super::core_config::{CoreConfig, KeyAlgorithmType, MasterKeyStorageType};

#[test]
fn test_default_config_is_valid() {
    let config = CoreConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.key_algorithm, KeyAlgorithmType::EcdsaP256);
    assert_eq!(config.intermediate_ca.default_path_length, 2);
    assert_eq!(config.issuance.serial_number_length, 16);
    assert_eq!(config.master_key.storage, MasterKeyStorageType::Memory);
}

#[test]
fn test_parse_yaml_merges_in_order() {
    let base = r#"
keyAlgorithm: EDDSA
rootCa:
  commonName: Acme Root
  organization: Acme
  validityDays: 7300
intermediateCa:
  defaultPathLength: 3
"#;
    let overlay = r#"
rootCa:
  validityDays: 1000
masterKey:
  storage: FILE
  directory: /var/lib/pki/keys
"#;

    let config = CoreConfig::from_yaml([base, overlay]).unwrap();

    assert_eq!(config.key_algorithm, KeyAlgorithmType::Eddsa);
    assert_eq!(config.root_ca.common_name, "Acme Root");
    assert_eq!(config.root_ca.organization.as_deref(), Some("Acme"));
    assert_eq!(config.root_ca.validity_days, 1000);
    assert_eq!(config.intermediate_ca.default_path_length, 3);
    // untouched sections keep their defaults
    assert_eq!(config.intermediate_ca.validity_days, 1825);
    assert_eq!(config.master_key.storage, MasterKeyStorageType::File);
    assert_eq!(
        config.master_key.directory,
        Some(PathBuf::from("/var/lib/pki/keys"))
    );
}

#[test]
fn test_file_storage_requires_directory() {
    let result = CoreConfig::from_yaml(["masterKey:\n  storage: FILE\n"]);
    assert!(result.is_err());
}

#[test]
fn test_invalid_serial_length_rejected() {
    let result = CoreConfig::from_yaml(["issuance:\n  serialNumberLength: 32\n"]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_key_algorithm_rejected() {
    let result = CoreConfig::from_yaml(["keyAlgorithm: RSA\n"]);
    assert!(result.is_err());
}

#[test]
fn test_from_files_rejects_unknown_extension() {
    let result = CoreConfig::from_files(&["config.toml"]);
    assert!(result.is_err());
}

#[test]
fn test_from_files_reads_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(&path, "endEntity:\n  validityDays: 90\n").unwrap();

    let config = CoreConfig::from_files(&[path]).unwrap();
    assert_eq!(config.end_entity.validity_days, 90);
}
