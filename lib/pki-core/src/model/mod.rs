pub mod certificate;
pub mod csr;
pub mod list_query;
pub mod master_key;
pub mod revocation;
pub mod template;
