//! Identity type and module.
//!
//! An identity is an X.509 signing credential issued by the certificate authority: a
//! certificate, the matching private key, and the membership service provider it belongs to.
//! Identities are keyed by label in a [`CredentialStore`](crate::wallet::CredentialStore);
//! the label is not part of the record.
use crate::error::identity::LoadSigningKeyError;

pub mod signing;

pub use signing::IdentitySigner;

pub const X509_IDENTITY_TYPE: &str = "X.509";

#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    msp_id: String,
    certificate: String,
    private_key: String,
}

impl Identity {
    pub fn new(
        msp_id: impl Into<String>,
        certificate: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            msp_id: msp_id.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    /// The PEM encoded certificate.
    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    /// The PEM encoded PKCS#8 private key.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn signer(&self) -> Result<IdentitySigner, LoadSigningKeyError> {
        IdentitySigner::from_pem(&self.private_key)
    }
}

// Private keys must never end up in logs.
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("msp_id", &self.msp_id)
            .field("certificate", &self.certificate)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
