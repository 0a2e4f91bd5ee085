use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Failed to decrypt content")]
    DecryptContentFailed(#[source] aes_gcm::Error),

    #[error("Failed to encrypt content")]
    EncryptContentFailed(#[source] aes_gcm::Error),

    #[error("Failed to hash password")]
    HashPasswordFailed(#[source] argon2::Error),

    #[error("Invalid key derivation parameters")]
    InvalidArgonParams(#[source] argon2::Error),

    #[error("Stored nonce has length {0}, expected 12")]
    InvalidNonceLength(usize),

    #[error("Failed to generate nonce")]
    NonceGenerationFailed(#[source] ring::error::Unspecified),

    #[error("Encrypted content is not valid base64")]
    DecodeContentFailed(#[source] base64::DecodeError),

    #[error("Decrypted content is not valid UTF-8")]
    DecryptedContentNotUtf8(#[source] std::string::FromUtf8Error),

    #[error("An encrypted identity was found but no wallet password is configured")]
    PasswordMissing,

    #[error("Failed to generate salt")]
    SaltGenerationFailed(#[source] ring::error::Unspecified),
}
