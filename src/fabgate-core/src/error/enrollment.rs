use crate::error::identity::LoadSigningKeyError;
use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreateCaClientError {
    #[error("Invalid certificate authority url '{0}'")]
    InvalidUrl(Box<String>, #[source] url::ParseError),

    #[error("Failed to parse the certificate authority trust anchor")]
    InvalidTrustAnchor(#[source] reqwest::Error),

    #[error("Failed to build the certificate authority HTTP client")]
    BuildClientFailed(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("Certificate authority at {0} is unreachable")]
    CaUnreachable(Box<String>, #[source] reqwest::Error),

    #[error("Certificate authority rejected the enrollment of '{principal}' (status {status}): {message}")]
    Rejected {
        principal: Box<String>,
        status: u16,
        message: String,
    },

    #[error("Certificate authority returned a malformed enrollment response: {0}")]
    MalformedResponse(String),

    #[error("Failed to generate a certificate signing request")]
    CsrGenerationFailed(#[source] rcgen::Error),
}

impl EnrollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnrollError::CaUnreachable(..) => ErrorKind::CaUnreachable,
            _ => ErrorKind::EnrollmentFailed,
        }
    }
}

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("Certificate authority at {0} is unreachable")]
    CaUnreachable(Box<String>, #[source] reqwest::Error),

    #[error("Certificate authority rejected the registration of '{principal}' (status {status}): {message}")]
    Rejected {
        principal: Box<String>,
        status: u16,
        message: String,
    },

    #[error("Certificate authority returned a malformed registration response: {0}")]
    MalformedResponse(String),

    #[error("The registrar identity cannot sign requests")]
    InvalidRegistrar(#[source] LoadSigningKeyError),

    #[error("The registrar session has already been closed")]
    SessionClosed(),

    #[error("Failed to serialize the registration request")]
    SerializeRequestFailed(#[source] serde_json::Error),
}

impl RegisterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegisterError::CaUnreachable(..) => ErrorKind::CaUnreachable,
            _ => ErrorKind::RegistrationFailed,
        }
    }
}
