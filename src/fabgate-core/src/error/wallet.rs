use crate::error::encryption::EncryptionError;
use crate::error::io::IoError;
use crate::error::structured_file::StructuredFileError;
use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Invalid identity label '{label}': {reason}")]
pub struct InvalidLabelError {
    pub label: String,
    pub reason: &'static str,
}

#[derive(Error, Debug)]
pub enum PutIdentityError {
    #[error("An identity labelled '{0}' already exists in the wallet")]
    AlreadyExists(Box<String>),

    #[error(transparent)]
    InvalidLabel(InvalidLabelError),

    #[error("Failed to encrypt the private key of identity '{0}'")]
    EncryptIdentityFailed(Box<String>, #[source] EncryptionError),

    #[error("Failed to serialize identity '{0}'")]
    SerializeIdentityFailed(Box<String>, #[source] serde_json::Error),

    #[error("Failed to write identity '{0}' to the wallet")]
    WriteIdentityFailed(Box<String>, #[source] IoError),

    #[error("The wallet write did not complete")]
    WriteTaskFailed(#[from] tokio::task::JoinError),
}

impl PutIdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PutIdentityError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            PutIdentityError::InvalidLabel(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Error, Debug)]
pub enum GetIdentityError {
    #[error("No identity labelled '{0}' exists in the wallet")]
    NotFound(Box<String>),

    #[error(transparent)]
    InvalidLabel(InvalidLabelError),

    #[error("Failed to read identity '{0}' from the wallet")]
    ReadIdentityFailed(Box<String>, #[source] StructuredFileError),

    #[error("Identity '{0}' has unsupported type '{1}'")]
    UnsupportedIdentityType(Box<String>, String),

    #[error("Failed to decrypt the private key of identity '{0}'")]
    DecryptIdentityFailed(Box<String>, #[source] EncryptionError),

    #[error("The wallet read did not complete")]
    ReadTaskFailed(#[from] tokio::task::JoinError),
}

impl GetIdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GetIdentityError::NotFound(_) => ErrorKind::NotFound,
            GetIdentityError::InvalidLabel(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Error, Debug)]
pub enum ListIdentitiesError {
    #[error("Failed to list the wallet directory")]
    ReadWalletDirFailed(#[source] IoError),
}

#[derive(Error, Debug)]
pub enum OpenWalletError {
    #[error("Failed to create the wallet directory")]
    CreateWalletDirFailed(#[source] IoError),
}
