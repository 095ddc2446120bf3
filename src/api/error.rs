//! Mapping of service errors onto HTTP responses.

use crate::error::ErrorKind;
use crate::identity::services::UserSearchError;
use crate::invitation::services::InvitationServiceError;
use crate::membership::services::MembershipServiceError;
use crate::project::services::ProjectServiceError;
use crate::task::services::TaskServiceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Failure returned by a handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The caller identity header is missing or malformed.
    #[error("authentication required")]
    Unauthenticated,
    /// Project registry failure.
    #[error(transparent)]
    Projects(#[from] ProjectServiceError),
    /// Invitation ledger failure.
    #[error(transparent)]
    Invitations(#[from] InvitationServiceError),
    /// Invitation resolution failure.
    #[error(transparent)]
    Membership(#[from] MembershipServiceError),
    /// Task failure.
    #[error(transparent)]
    Tasks(#[from] TaskServiceError),
    /// User search failure.
    #[error(transparent)]
    Users(#[from] UserSearchError),
}

impl ApiError {
    /// Returns the classification, or `None` for authentication failures.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Unauthenticated => None,
            Self::Projects(err) => Some(err.kind()),
            Self::Invitations(err) => Some(err.kind()),
            Self::Membership(err) => Some(err.kind()),
            Self::Tasks(err) => Some(err.kind()),
            Self::Users(err) => Some(err.kind()),
        }
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.kind() {
            None => StatusCode::UNAUTHORIZED,
            Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            Some(ErrorKind::Permission) => StatusCode::FORBIDDEN,
            Some(ErrorKind::Conflict) => StatusCode::CONFLICT,
            Some(ErrorKind::Validation | ErrorKind::Expired) => StatusCode::BAD_REQUEST,
            Some(ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match self.kind() {
            None => ("unauthenticated", self.to_string()),
            Some(ErrorKind::Internal) => {
                error!(error = %self, "request failed");
                (ErrorKind::Internal.as_str(), "Server error".to_owned())
            }
            Some(kind) => (kind.as_str(), self.to_string()),
        };
        (status, Json(json!({ "message": message, "kind": kind }))).into_response()
    }
}
