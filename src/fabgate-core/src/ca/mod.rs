//! The certificate authority: enrollment and admin-authorized registration.
//!
//! Neither operation is retried. Enrollment secrets are single-use, so whether to try again
//! is the caller's decision.
use crate::error::enrollment::{EnrollError, RegisterError};
use crate::identity::Identity;
use async_trait::async_trait;

pub mod csr;
pub mod fabric;

pub use fabric::FabricCaClient;

/// Exchanges `secret` for a certificate issued to `principal_id`.
#[derive(Clone)]
pub struct EnrollmentRequest {
    pub principal_id: String,
    pub secret: String,
}

impl EnrollmentRequest {
    pub fn new(principal_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for EnrollmentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentRequest")
            .field("principal_id", &self.principal_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct RegistrationRequest {
    pub principal_id: String,
    pub affiliation: String,
}

/// A signed certificate and the private key it was issued for, both PEM encoded.
#[derive(Clone)]
pub struct Enrollment {
    pub certificate: String,
    pub private_key: String,
}

impl Enrollment {
    pub fn into_identity(self, msp_id: &str) -> Identity {
        Identity::new(msp_id, self.certificate, self.private_key)
    }
}

#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    async fn enroll(&self, request: &EnrollmentRequest) -> Result<Enrollment, EnrollError>;

    /// Opens a session in which `registrar` authorizes registrations.
    async fn open_session(&self, registrar: &Identity)
        -> Result<Box<dyn CaSession>, RegisterError>;

    /// Registers a new principal and returns its one-time enrollment secret.
    async fn register(
        &self,
        request: &RegistrationRequest,
        registrar: &Identity,
    ) -> Result<String, RegisterError> {
        let mut session = CaSessionGuard::new(self.open_session(registrar).await?);
        let secret = session.register(request).await;
        session.close();
        secret
    }
}

#[async_trait]
pub trait CaSession: Send {
    async fn register(&mut self, request: &RegistrationRequest) -> Result<String, RegisterError>;

    /// Ends the session. Closing twice is a no-op.
    fn close(&mut self);
}

/// Closes the wrapped session when dropped, so every exit path releases it.
pub struct CaSessionGuard {
    session: Box<dyn CaSession>,
}

impl CaSessionGuard {
    pub fn new(session: Box<dyn CaSession>) -> Self {
        Self { session }
    }

    pub async fn register(&mut self, request: &RegistrationRequest) -> Result<String, RegisterError> {
        self.session.register(request).await
    }

    pub fn close(&mut self) {
        self.session.close();
    }
}

impl Drop for CaSessionGuard {
    fn drop(&mut self) {
        self.session.close();
    }
}
