use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::aead::Nonce;
use chacha20poly1305::{AeadCore, ChaCha20Poly1305};
use secrecy::{ExposeSecret, SecretSlice, SecretString};

use crate::password::{SALT_LENGTH, derive_key, derive_key_with_salt};
use crate::utilities::{generate_random_bytes, get_rng};

/// AES-GCM nonce length (96 bits)
pub const NONCE_LENGTH: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("invalid key length: {0}")]
    InvalidKeyLength(usize),
    #[error("ciphertext too short")]
    Truncated,
    #[error("crypto error: {0}")]
    Crypto(String),
}

pub fn encrypt_string(
    data: &SecretString,
    encryption_key: &SecretSlice<u8>,
) -> Result<Vec<u8>, EncryptionError> {
    encrypt_data(
        &SecretSlice::from(data.expose_secret().as_bytes().to_vec()),
        encryption_key,
    )
}

/// AES-256-GCM with a fresh random nonce, output is `nonce || ciphertext`
pub fn encrypt_data(
    data: &SecretSlice<u8>,
    encryption_key: &SecretSlice<u8>,
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = aes_cipher(encryption_key)?;

    let nonce = generate_random_bytes::<NONCE_LENGTH>();
    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), data.expose_secret())
        .map_err(|err| EncryptionError::Crypto(format!("failed to encrypt: {err}")))?;

    let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

pub fn decrypt_string(
    data: &[u8],
    encryption_key: &SecretSlice<u8>,
) -> Result<SecretString, EncryptionError> {
    let decrypted = decrypt_data(data, encryption_key)?;
    Ok(SecretString::from(
        String::from_utf8(decrypted.expose_secret().to_vec()).map_err(|err| {
            EncryptionError::Crypto(format!("failed to decrypt string data: {err}"))
        })?,
    ))
}

pub fn decrypt_data(
    data: &[u8],
    encryption_key: &SecretSlice<u8>,
) -> Result<SecretSlice<u8>, EncryptionError> {
    if data.len() <= NONCE_LENGTH {
        return Err(EncryptionError::Truncated);
    }
    let (nonce, ciphertext) = data.split_at(NONCE_LENGTH);

    aes_cipher(encryption_key)?
        .decrypt(AesNonce::from_slice(nonce), ciphertext)
        .map(SecretSlice::from)
        .map_err(|err| EncryptionError::Crypto(format!("failed to decrypt: {err}")))
}

/// Seals `data` under a password: `salt || nonce || ciphertext`
pub fn encrypt_with_password(
    password: &SecretString,
    data: &SecretSlice<u8>,
) -> Result<Vec<u8>, EncryptionError> {
    let key = derive_key(password);

    let cipher = ChaCha20Poly1305::new_from_slice(key.key.expose_secret())
        .map_err(|err| EncryptionError::Crypto(err.to_string()))?;

    let nonce = ChaCha20Poly1305::generate_nonce(get_rng());

    let ciphertext = cipher
        .encrypt(&nonce, data.expose_secret())
        .map_err(|err| EncryptionError::Crypto(err.to_string()))?;

    let mut result = Vec::with_capacity(key.salt.len() + nonce.len() + ciphertext.len());
    result.extend_from_slice(&key.salt);
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

pub fn decrypt_with_password(
    password: &SecretString,
    data: &[u8],
) -> Result<SecretSlice<u8>, EncryptionError> {
    let mut nonce = Nonce::<ChaCha20Poly1305>::default();
    if data.len() <= SALT_LENGTH + nonce.len() {
        return Err(EncryptionError::Truncated);
    }

    let (salt, rest) = data.split_at(SALT_LENGTH);
    let (nonce_bytes, ciphertext) = rest.split_at(nonce.len());
    nonce.copy_from_slice(nonce_bytes);

    let key = derive_key_with_salt(password, salt);
    let cipher = ChaCha20Poly1305::new_from_slice(key.expose_secret())
        .map_err(|err| EncryptionError::Crypto(err.to_string()))?;

    cipher
        .decrypt(&nonce, ciphertext)
        .map(SecretSlice::from)
        .map_err(|err| EncryptionError::Crypto(err.to_string()))
}

fn aes_cipher(encryption_key: &SecretSlice<u8>) -> Result<Aes256Gcm, EncryptionError> {
    let key = encryption_key.expose_secret();
    Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::InvalidKeyLength(key.len()))
}
