use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::utilities::generate_random_bytes;

pub const SALT_LENGTH: usize = 32;
const KEY_LENGTH: usize = 32;
const PBKDF2_ROUNDS: u32 = 100_000;

pub struct DerivedKey {
    pub key: SecretSlice<u8>,
    pub salt: [u8; SALT_LENGTH],
}

/// Derives a fresh key from `password` with a random salt
pub fn derive_key(password: &SecretString) -> DerivedKey {
    let salt = generate_random_bytes::<SALT_LENGTH>();
    DerivedKey {
        key: derive_key_with_salt(password, &salt),
        salt,
    }
}

pub fn derive_key_with_salt(password: &SecretString, salt: &[u8]) -> SecretSlice<u8> {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        PBKDF2_ROUNDS,
        &mut key,
    );
    let result = SecretSlice::from(key.to_vec());
    key.zeroize();
    result
}
