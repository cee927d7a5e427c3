pub mod certificate;
pub mod error;
pub mod master_key;
pub mod revocation;
pub mod template;
