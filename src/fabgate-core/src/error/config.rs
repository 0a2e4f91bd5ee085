use crate::error::structured_file::StructuredFileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot find home directory (no HOME environment variable).")]
    NoHomeInEnvironment(),
}

#[derive(Error, Debug)]
pub enum LoadGatewayConfigError {
    #[error("Failed to load gateway configuration from {0}")]
    LoadConfigFileFailed(Box<PathBuf>, #[source] StructuredFileError),

    #[error("Failed to determine the default wallet directory")]
    DetermineWalletDirectoryFailed(#[source] ConfigError),
}

#[derive(Error, Debug)]
pub enum LoadConnectionProfileError {
    #[error("Failed to load connection profile")]
    LoadProfileFailed(#[source] StructuredFileError),

    #[error("Failed to read TLS certificate {0} referenced by the connection profile")]
    ReadTlsCertificateFailed(Box<PathBuf>, #[source] crate::error::io::IoError),

    #[error("Connection profile does not define the client organization")]
    NoClientOrganization(),

    #[error("Organization '{0}' is not defined in the connection profile")]
    UnknownOrganization(String),

    #[error("Certificate authority '{0}' is not defined in the connection profile")]
    UnknownCertificateAuthority(String),

    #[error("Organization '{0}' has no peers in the connection profile")]
    NoPeers(String),

    #[error("Peer '{0}' is not defined in the connection profile")]
    UnknownPeer(String),
}
