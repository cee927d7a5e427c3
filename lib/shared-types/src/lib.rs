//! Identifier newtypes shared between the PKI crates

mod certificate_id;
mod macros;
mod revocation_id;
mod template_id;
mod user_id;

pub use certificate_id::CertificateId;
pub use revocation_id::RevocationId;
pub use template_id::TemplateId;
pub use user_id::UserId;
