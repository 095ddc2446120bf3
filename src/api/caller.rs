//! Authenticated caller extraction.

use super::ApiError;
use crate::identity::domain::UserId;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the authenticated user identifier.
pub const CALLER_HEADER: &str = "x-user-id";

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or(ApiError::Unauthenticated)?
            .to_str()
            .map_err(|_| ApiError::Unauthenticated)?;
        UserId::parse(raw)
            .map(Self)
            .map_err(|_| ApiError::Unauthenticated)
    }
}
