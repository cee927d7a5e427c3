//! Symmetric primitives used for private key custody and export bundles

pub mod encryption;
pub mod password;
pub mod utilities;
