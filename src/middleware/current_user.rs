use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::UserId};

/// HTTP header carrying the authenticated caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, as forwarded by the authentication layer
///
/// Requests without a valid numeric `x-user-id` header are rejected with 401.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl CurrentUser {
    /// Rejects access to resources owned by another user
    pub fn authorize(&self, owner: UserId) -> Result<(), AppError> {
        if self.0 == owner {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<UserId>().ok())
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
