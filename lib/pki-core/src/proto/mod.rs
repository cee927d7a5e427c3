pub mod chain_validator;
pub mod clock;
pub mod csr_verifier;
pub mod key_custodian;
pub mod template_policy;
