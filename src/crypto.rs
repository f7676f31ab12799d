// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret Encryption
//!
//! Secrets (OAuth client secrets, SMTP passwords, target signing keys) are
//! encrypted before they are embedded in an event payload. Commands only see
//! the [`SecretCrypto`] trait; the envelope written to the log is a
//! [`CryptoValue`].
//!
//! [`Blake3DevCrypto`] is a keyed stream cipher for development and tests. It
//! keeps plaintext out of the log but is not meant to guard production secrets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CommandError, CommandResult};

/// Kind of protection applied to a secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoType {
    Encryption,
    Hash,
}

/// Encrypted secret as stored in an event payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CryptoValue {
    pub crypto_type: CryptoType,
    pub algorithm: String,
    pub key_id: String,
    pub crypted: Vec<u8>,
}

/// Secret encryption collaborator
#[async_trait]
pub trait SecretCrypto: Send + Sync {
    /// Encrypt a plaintext secret
    async fn encrypt(&self, plaintext: &[u8]) -> CommandResult<CryptoValue>;

    /// Generate a fresh signing key, returned encrypted
    async fn generate_signing_key(&self) -> CommandResult<CryptoValue>;

    /// Decrypt a value produced by [`SecretCrypto::encrypt`]
    async fn decrypt(&self, value: &CryptoValue) -> CommandResult<Vec<u8>>;
}

const NONCE_LEN: usize = 16;
const SIGNING_KEY_LEN: usize = 32;

/// Development cipher: blake3 keyed XOF keystream with a per-value nonce
pub struct Blake3DevCrypto {
    key_id: String,
    key: [u8; 32],
}

impl Blake3DevCrypto {
    pub const ALGORITHM: &'static str = "blake3-xof-dev";

    pub fn new(key_id: impl Into<String>, master_key: &[u8]) -> Self {
        Self {
            key_id: key_id.into(),
            key: *blake3::hash(master_key).as_bytes(),
        }
    }

    fn apply_keystream(&self, nonce: &[u8], data: &mut [u8]) {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(nonce);
        let mut reader = hasher.finalize_xof();
        let mut stream = vec![0u8; data.len()];
        reader.fill(&mut stream);
        for (byte, key) in data.iter_mut().zip(stream) {
            *byte ^= key;
        }
    }
}

#[async_trait]
impl SecretCrypto for Blake3DevCrypto {
    async fn encrypt(&self, plaintext: &[u8]) -> CommandResult<CryptoValue> {
        let nonce = Uuid::now_v7().into_bytes();
        let mut body = plaintext.to_vec();
        self.apply_keystream(&nonce, &mut body);

        let mut crypted = Vec::with_capacity(NONCE_LEN + body.len());
        crypted.extend_from_slice(&nonce);
        crypted.extend_from_slice(&body);

        Ok(CryptoValue {
            crypto_type: CryptoType::Encryption,
            algorithm: Self::ALGORITHM.to_string(),
            key_id: self.key_id.clone(),
            crypted,
        })
    }

    async fn generate_signing_key(&self) -> CommandResult<CryptoValue> {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(b"signing-key");
        hasher.update(Uuid::now_v7().as_bytes());
        let mut key = [0u8; SIGNING_KEY_LEN];
        hasher.finalize_xof().fill(&mut key);
        self.encrypt(&key).await
    }

    async fn decrypt(&self, value: &CryptoValue) -> CommandResult<Vec<u8>> {
        if value.algorithm != Self::ALGORITHM || value.key_id != self.key_id {
            return Err(CommandError::Crypto(format!(
                "unsupported key {} ({})",
                value.key_id, value.algorithm
            )));
        }
        if value.crypted.len() < NONCE_LEN {
            return Err(CommandError::Crypto("ciphertext too short".to_string()));
        }

        let (nonce, body) = value.crypted.split_at(NONCE_LEN);
        let mut plaintext = body.to_vec();
        self.apply_keystream(nonce, &mut plaintext);
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_encrypt_hides_plaintext_and_decrypts() {
        let crypto = Blake3DevCrypto::new("key1", b"master");

        let value = crypto.encrypt(b"client-secret").await.unwrap();

        assert_eq!(value.crypto_type, CryptoType::Encryption);
        assert!(!value
            .crypted
            .windows(b"client-secret".len())
            .any(|w| w == b"client-secret"));
        assert_eq!(crypto.decrypt(&value).await.unwrap(), b"client-secret");
    }

    #[tokio::test]
    async fn test_same_plaintext_encrypts_differently() {
        let crypto = Blake3DevCrypto::new("key1", b"master");

        let a = crypto.encrypt(b"secret").await.unwrap();
        let b = crypto.encrypt(b"secret").await.unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_decrypt_rejects_foreign_key() {
        let ours = Blake3DevCrypto::new("key1", b"master");
        let theirs = Blake3DevCrypto::new("key2", b"master");

        let value = theirs.encrypt(b"secret").await.unwrap();

        assert!(matches!(
            ours.decrypt(&value).await,
            Err(CommandError::Crypto(_))
        ));
    }

    #[tokio::test]
    async fn test_signing_keys_are_unique() {
        let crypto = Blake3DevCrypto::new("key1", b"master");

        let a = crypto.generate_signing_key().await.unwrap();
        let b = crypto.generate_signing_key().await.unwrap();

        assert_ne!(
            crypto.decrypt(&a).await.unwrap(),
            crypto.decrypt(&b).await.unwrap()
        );
    }
}
