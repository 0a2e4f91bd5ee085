//! At-rest encryption of private keys.
//!
//! The key is derived from the wallet password with Argon2id and a per-identity salt; the
//! private key is then sealed with AES-256-GCM under a per-identity nonce. Salt and nonce are
//! stored next to the ciphertext, the password never is.
use crate::error::encryption::EncryptionError;
use crate::error::encryption::EncryptionError::{
    DecryptContentFailed, EncryptContentFailed, HashPasswordFailed, InvalidArgonParams,
    InvalidNonceLength, NonceGenerationFailed, SaltGenerationFailed,
};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use ring::{rand, rand::SecureRandom};
use serde::{Deserialize, Serialize};

const NONCE_LENGTH: usize = 12;

/// The information necessary to de- and encrypt (except the password) an identity's private key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfiguration {
    /// Salt used for deriving the key from the password
    pub pw_salt: String,

    /// 96 bit nonce used to seal the private key
    pub key_nonce: Vec<u8>,
}

impl EncryptionConfiguration {
    /// Generates a random salt and nonce. Use this for every new identity.
    pub fn new() -> Result<Self, EncryptionError> {
        let mut nonce: [u8; NONCE_LENGTH] = [0; NONCE_LENGTH];
        let mut salt: [u8; 32] = [0; 32];
        let sr = rand::SystemRandom::new();
        sr.fill(&mut nonce).map_err(NonceGenerationFailed)?;
        sr.fill(&mut salt).map_err(SaltGenerationFailed)?;

        Ok(Self {
            pw_salt: hex::encode(salt),
            key_nonce: nonce.into(),
        })
    }

    fn checked_nonce(&self) -> Result<&[u8], EncryptionError> {
        if self.key_nonce.len() != NONCE_LENGTH {
            return Err(InvalidNonceLength(self.key_nonce.len()));
        }
        Ok(self.key_nonce.as_slice())
    }
}

fn get_argon_params() -> Result<argon2::Params, EncryptionError> {
    argon2::Params::new(64000 /* in kb */, 3, 1, Some(32 /* in bytes */))
        .map_err(InvalidArgonParams)
}

fn cipher(config: &EncryptionConfiguration, password: &str) -> Result<Aes256Gcm, EncryptionError> {
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        get_argon_params()?,
    );
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), config.pw_salt.as_bytes(), &mut key)
        .map_err(HashPasswordFailed)?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)))
}

pub fn encrypt(
    content: &[u8],
    config: &EncryptionConfiguration,
    password: &str,
) -> Result<Vec<u8>, EncryptionError> {
    cipher(config, password)?
        .encrypt(Nonce::from_slice(config.checked_nonce()?), content)
        .map_err(EncryptContentFailed)
}

pub fn decrypt(
    encrypted_content: &[u8],
    config: &EncryptionConfiguration,
    password: &str,
) -> Result<Vec<u8>, EncryptionError> {
    cipher(config, password)?
        .decrypt(Nonce::from_slice(config.checked_nonce()?), encrypted_content)
        .map_err(DecryptContentFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))] // key derivation is deliberately slow
        #[test]
        fn decrypt_reverts_encrypt(pass in ".*", content in ".*") {
            let config = EncryptionConfiguration::new().unwrap();
            let encrypted = encrypt(content.as_bytes(), &config, &pass).unwrap();
            let decrypted = decrypt(&encrypted, &config, &pass).unwrap();

            prop_assert_eq!(content.as_bytes(), decrypted.as_slice());
        }
    }

    #[test]
    fn wrong_password_fails_to_decrypt() {
        let config = EncryptionConfiguration::new().unwrap();
        let encrypted = encrypt(b"private key", &config, "right").unwrap();
        assert!(matches!(
            decrypt(&encrypted, &config, "wrong"),
            Err(DecryptContentFailed(_))
        ));
    }

    #[test]
    fn fresh_configurations_do_not_repeat() {
        let a = EncryptionConfiguration::new().unwrap();
        let b = EncryptionConfiguration::new().unwrap();
        assert_ne!(a.pw_salt, b.pw_salt);
        assert_ne!(a.key_nonce, b.key_nonce);
    }

    #[test]
    fn truncated_nonce_is_rejected() {
        let mut config = EncryptionConfiguration::new().unwrap();
        config.key_nonce.truncate(4);
        assert!(matches!(
            encrypt(b"x", &config, "pw"),
            Err(InvalidNonceLength(4))
        ));
    }
}
