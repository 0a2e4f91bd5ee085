use crate::error::identity::LoadSigningKeyError;
use crate::error::wallet::GetIdentityError;
use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Invalid peer endpoint '{0}'")]
    InvalidEndpoint(Box<String>, #[source] tonic::transport::Error),

    #[error("Invalid peer endpoint '{0}'")]
    InvalidEndpointUrl(Box<String>, #[source] url::ParseError),

    #[error("Failed to configure TLS for peer '{0}'")]
    TlsConfigFailed(Box<String>, #[source] tonic::transport::Error),

    #[error("Failed to connect to peer '{0}'")]
    TransportFailed(Box<String>, #[source] tonic::transport::Error),

    #[error("The identity cannot sign proposals")]
    InvalidSigningIdentity(#[source] LoadSigningKeyError),
}

#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error("Peer returned status {status}: {message}")]
    Rejected { status: i32, message: String },

    #[error("Gateway call failed")]
    Status(#[source] tonic::Status),

    #[error("Peer is unavailable")]
    Unavailable(#[source] tonic::transport::Error),

    #[error("Gateway response did not contain a result")]
    MissingResult(),

    #[error("The connection has already been closed")]
    Disconnected(),

    #[error("Failed to generate a transaction nonce")]
    NonceGenerationFailed(#[source] ring::error::Unspecified),
}

impl EvaluateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaluateError::Unavailable(_) | EvaluateError::Disconnected() => {
                ErrorKind::ConnectionFailed
            }
            EvaluateError::Status(status) if status.code() == tonic::Code::Unavailable => {
                ErrorKind::ConnectionFailed
            }
            _ => ErrorKind::EvaluationFailed,
        }
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("An identity for the user '{0}' does not exist in the wallet")]
    IdentityMissing(Box<String>),

    #[error("Failed to load identity '{0}'")]
    LoadIdentityFailed(Box<String>, #[source] GetIdentityError),

    #[error("Failed to connect to the ledger network as '{0}'")]
    ConnectFailed(Box<String>, #[source] ConnectError),

    #[error("Channel '{0}' was not found")]
    ChannelNotFound(Box<String>),

    #[error("Contract '{contract}' was not found on channel '{channel}'")]
    ContractNotFound {
        channel: Box<String>,
        contract: Box<String>,
    },

    #[error("Failed to evaluate transaction '{0}'")]
    EvaluationFailed(Box<String>, #[source] EvaluateError),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::IdentityMissing(_) => ErrorKind::IdentityMissing,
            QueryError::LoadIdentityFailed(..) => ErrorKind::Internal,
            QueryError::ConnectFailed(..) => ErrorKind::ConnectionFailed,
            QueryError::ChannelNotFound(_) => ErrorKind::ChannelNotFound,
            QueryError::ContractNotFound { .. } => ErrorKind::ContractNotFound,
            QueryError::EvaluationFailed(_, err) => err.kind(),
        }
    }
}
