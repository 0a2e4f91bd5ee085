use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadSigningKeyError {
    #[error("Failed to parse private key as PKCS#8 PEM")]
    ParsePrivateKeyFailed(#[source] p256::pkcs8::Error),

    #[error("Failed to parse private key as SEC1 PEM")]
    ParseSec1PrivateKeyFailed(#[source] p256::elliptic_curve::Error),
}
