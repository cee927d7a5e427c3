use secrecy::SecretSlice;

/// Symmetric envelope key, identified by a stable id
#[derive(Debug)]
pub struct MasterKey {
    pub id: String,
    pub key: SecretSlice<u8>,
}
