use crate::error::enrollment::{EnrollError, RegisterError};
use crate::error::wallet::{GetIdentityError, InvalidLabelError, PutIdentityError};
use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollAdminError {
    #[error("An identity for the admin '{0}' already exists in the wallet")]
    AdminAlreadyEnrolled(Box<String>),

    #[error("Failed to enroll admin '{0}'")]
    AdminEnrollmentFailed(Box<String>, #[source] EnrollError),

    #[error("Failed to import admin '{0}' into the wallet")]
    StoreAdminFailed(Box<String>, #[source] PutIdentityError),
}

impl EnrollAdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnrollAdminError::AdminAlreadyEnrolled(_) => ErrorKind::AdminAlreadyEnrolled,
            EnrollAdminError::AdminEnrollmentFailed(_, err) => match err.kind() {
                ErrorKind::CaUnreachable => ErrorKind::CaUnreachable,
                _ => ErrorKind::AdminEnrollmentFailed,
            },
            EnrollAdminError::StoreAdminFailed(_, err) => match err.kind() {
                ErrorKind::AlreadyExists => ErrorKind::AdminAlreadyEnrolled,
                _ => ErrorKind::AdminEnrollmentFailed,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum RegisterUserError {
    #[error(transparent)]
    InvalidLabel(InvalidLabelError),

    #[error("An identity for the user '{0}' already exists in the wallet")]
    UserAlreadyExists(Box<String>),

    #[error("An identity for the admin '{0}' does not exist in the wallet")]
    AdminMissing(Box<String>),

    #[error("Failed to load the admin identity")]
    LoadAdminFailed(#[source] GetIdentityError),

    #[error("Failed to register user '{0}'")]
    RegistrationFailed(Box<String>, #[source] RegisterError),

    #[error("Failed to enroll user '{0}'")]
    EnrollmentFailed(Box<String>, #[source] EnrollError),

    #[error("Failed to import user '{0}' into the wallet")]
    StoreUserFailed(Box<String>, #[source] PutIdentityError),
}

impl RegisterUserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegisterUserError::InvalidLabel(_) => ErrorKind::InvalidInput,
            RegisterUserError::UserAlreadyExists(_) => ErrorKind::UserAlreadyExists,
            RegisterUserError::AdminMissing(_) => ErrorKind::AdminMissing,
            RegisterUserError::LoadAdminFailed(_) => ErrorKind::Internal,
            RegisterUserError::RegistrationFailed(_, err) => err.kind(),
            RegisterUserError::EnrollmentFailed(_, err) => err.kind(),
            RegisterUserError::StoreUserFailed(_, err) => match err.kind() {
                ErrorKind::AlreadyExists => ErrorKind::UserAlreadyExists,
                kind => kind,
            },
        }
    }
}
