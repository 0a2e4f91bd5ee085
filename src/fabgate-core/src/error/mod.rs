use serde::{Deserialize, Serialize};

pub mod config;
pub mod enrollment;
pub mod encryption;
pub mod identity;
pub mod io;
pub mod ledger;
pub mod lifecycle;
pub mod structured_file;
pub mod wallet;

/// The flat classification of every failure the core can report.
///
/// Boundary layers (CLI, HTTP) branch on this rather than on the error types themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    AdminAlreadyEnrolled,
    AdminEnrollmentFailed,
    AdminMissing,
    UserAlreadyExists,
    CaUnreachable,
    EnrollmentFailed,
    RegistrationFailed,
    IdentityMissing,
    ConnectionFailed,
    ChannelNotFound,
    ContractNotFound,
    EvaluationFailed,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AdminAlreadyEnrolled => "admin_already_enrolled",
            ErrorKind::AdminEnrollmentFailed => "admin_enrollment_failed",
            ErrorKind::AdminMissing => "admin_missing",
            ErrorKind::UserAlreadyExists => "user_already_exists",
            ErrorKind::CaUnreachable => "ca_unreachable",
            ErrorKind::EnrollmentFailed => "enrollment_failed",
            ErrorKind::RegistrationFailed => "registration_failed",
            ErrorKind::IdentityMissing => "identity_missing",
            ErrorKind::ConnectionFailed => "connection_failed",
            ErrorKind::ChannelNotFound => "channel_not_found",
            ErrorKind::ContractNotFound => "contract_not_found",
            ErrorKind::EvaluationFailed => "evaluation_failed",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
