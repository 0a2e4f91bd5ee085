use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fabgate_core::error::lifecycle::{EnrollAdminError, RegisterUserError};
use fabgate_core::error::ledger::QueryError;
use fabgate_core::error::ErrorKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}

/// A failure as the client sees it: its kind, and the error chain as text.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            message: message.into(),
        }
    }

    fn from_error(kind: ErrorKind, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { kind, message }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::AlreadyExists | ErrorKind::AdminAlreadyEnrolled | ErrorKind::UserAlreadyExists => {
            StatusCode::CONFLICT
        }
        ErrorKind::NotFound
        | ErrorKind::IdentityMissing
        | ErrorKind::ChannelNotFound
        | ErrorKind::ContractNotFound => StatusCode::NOT_FOUND,
        ErrorKind::AdminMissing => StatusCode::PRECONDITION_FAILED,
        ErrorKind::CaUnreachable
        | ErrorKind::EnrollmentFailed
        | ErrorKind::RegistrationFailed
        | ErrorKind::AdminEnrollmentFailed
        | ErrorKind::ConnectionFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::EvaluationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EnrollAdminError> for ApiError {
    fn from(err: EnrollAdminError) -> Self {
        Self::from_error(err.kind(), &err)
    }
}

impl From<RegisterUserError> for ApiError {
    fn from(err: RegisterUserError) -> Self {
        Self::from_error(err.kind(), &err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::from_error(err.kind(), &err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            status_for(self.kind),
            Json(ErrorResponse {
                error: self.kind,
                message: self.message,
            }),
        )
            .into_response()
    }
}
