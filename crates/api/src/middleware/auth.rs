//! User identification for protected routes.
//!
//! Bearer token validation happens at the gateway; by the time a
//! request reaches this service the caller's identity arrives in the
//! `X-User-Id` header. Handlers still re-validate authorization rules
//! (such as the self-approval ban) server-side.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use fiscus_shared::types::UserId;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    /// The authenticated user's id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok());

        let Some(value) = header else {
            return Err(unauthorized("X-User-Id header is required"));
        };

        let user_id = value
            .parse::<Uuid>()
            .map_err(|_| unauthorized("X-User-Id header must be a valid UUID"))?;

        Ok(Self(UserId::from(user_id)))
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
