//! Admin bootstrap and user onboarding.
//!
//! Both flows only write to the wallet after the certificate authority has fully issued a
//! credential, so a failure never leaves a partial identity behind.
use crate::ca::{CaSessionGuard, CertificateAuthority, EnrollmentRequest, RegistrationRequest};
use crate::config::{AdminConfig, GatewayConfig};
use crate::error::lifecycle::EnrollAdminError::{
    AdminAlreadyEnrolled, AdminEnrollmentFailed, StoreAdminFailed,
};
use crate::error::lifecycle::RegisterUserError::{
    AdminMissing, EnrollmentFailed, InvalidLabel, LoadAdminFailed, RegistrationFailed,
    StoreUserFailed, UserAlreadyExists,
};
use crate::error::lifecycle::{EnrollAdminError, RegisterUserError};
use crate::error::wallet::{GetIdentityError, PutIdentityError};
use crate::wallet::{get_blocking, put_blocking, validate_label, CredentialStore};
use slog::{debug, info, Logger};
use std::sync::Arc;

mod locks;

use locks::LabelLocks;

pub struct IdentityLifecycleManager {
    log: Logger,
    wallet: Arc<dyn CredentialStore>,
    ca: Arc<dyn CertificateAuthority>,
    msp_id: String,
    affiliation: String,
    admin: AdminConfig,
    locks: LabelLocks,
}

impl IdentityLifecycleManager {
    pub fn new(
        log: &Logger,
        config: &GatewayConfig,
        wallet: Arc<dyn CredentialStore>,
        ca: Arc<dyn CertificateAuthority>,
    ) -> Self {
        Self {
            log: log.clone(),
            wallet,
            ca,
            msp_id: config.msp_id.clone(),
            affiliation: config.affiliation.clone(),
            admin: config.admin.clone(),
            locks: LabelLocks::default(),
        }
    }

    pub fn admin_label(&self) -> &str {
        &self.admin.id
    }

    /// Enrolls the bootstrap admin with its well-known secret and stores the credential.
    pub async fn enroll_admin(&self) -> Result<(), EnrollAdminError> {
        let label = self.admin.id.as_str();
        let _lock = self.locks.lock(label).await;
        if self.wallet.exists(label) {
            return Err(AdminAlreadyEnrolled(Box::new(label.to_string())));
        }

        debug!(self.log, "Enrolling admin '{}'", label);
        let enrollment = self
            .ca
            .enroll(&EnrollmentRequest::new(label, &self.admin.secret))
            .await
            .map_err(|err| AdminEnrollmentFailed(Box::new(label.to_string()), err))?;
        put_blocking(&self.wallet, label, enrollment.into_identity(&self.msp_id))
            .await
            .map_err(|err| match err {
                PutIdentityError::AlreadyExists(label) => AdminAlreadyEnrolled(label),
                err => StoreAdminFailed(Box::new(label.to_string()), err),
            })?;

        info!(self.log, "Enrolled admin '{}' and imported it into the wallet", label);
        Ok(())
    }

    /// Registers `label` with the certificate authority on the admin's authority, enrolls it
    /// with the issued one-time secret and stores the credential.
    pub async fn register_user(&self, label: &str) -> Result<(), RegisterUserError> {
        validate_label(label).map_err(InvalidLabel)?;
        let _lock = self.locks.lock(label).await;
        if self.wallet.exists(label) {
            return Err(UserAlreadyExists(Box::new(label.to_string())));
        }
        let admin_label = self.admin.id.as_str();
        if !self.wallet.exists(admin_label) {
            return Err(AdminMissing(Box::new(admin_label.to_string())));
        }
        let admin = get_blocking(&self.wallet, admin_label)
            .await
            .map_err(|err| match err {
                GetIdentityError::NotFound(label) => AdminMissing(label),
                err => LoadAdminFailed(err),
            })?;

        let session = self
            .ca
            .open_session(&admin)
            .await
            .map_err(|err| RegistrationFailed(Box::new(label.to_string()), err))?;
        let mut session = CaSessionGuard::new(session);
        let onboarded = self.onboard(&mut session, label).await;
        session.close();
        onboarded?;

        info!(self.log, "Registered user '{}' and imported it into the wallet", label);
        Ok(())
    }

    async fn onboard(
        &self,
        session: &mut CaSessionGuard,
        label: &str,
    ) -> Result<(), RegisterUserError> {
        let registration = RegistrationRequest {
            principal_id: label.to_string(),
            affiliation: self.affiliation.clone(),
        };
        let secret = session
            .register(&registration)
            .await
            .map_err(|err| RegistrationFailed(Box::new(label.to_string()), err))?;

        let enrollment = self
            .ca
            .enroll(&EnrollmentRequest::new(label, secret))
            .await
            .map_err(|err| EnrollmentFailed(Box::new(label.to_string()), err))?;
        put_blocking(&self.wallet, label, enrollment.into_identity(&self.msp_id))
            .await
            .map_err(|err| match err {
                PutIdentityError::AlreadyExists(label) => UserAlreadyExists(label),
                err => StoreUserFailed(Box::new(label.to_string()), err),
            })
    }
}
