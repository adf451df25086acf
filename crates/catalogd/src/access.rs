//! Principal extraction and role checks
//!
//! Authentication happens upstream: the gateway in front of the daemon
//! verifies credentials and forwards the caller as three headers. This module
//! only reads them and decides whether the caller's role is allowed.

use axum::Json;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::str::FromStr;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_USERNAME_HEADER: &str = "x-principal-username";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

/// An already-authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Caller identity, if the gateway forwarded a complete one
///
/// Never rejects: a missing or malformed principal is `None`, and the
/// handler decides whether that matters.
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (Some(id), Some(username), Some(role)) = (
            header(PRINCIPAL_ID_HEADER),
            header(PRINCIPAL_USERNAME_HEADER),
            header(PRINCIPAL_ROLE_HEADER),
        ) else {
            return Ok(MaybePrincipal(None));
        };

        match role.parse::<Role>() {
            Ok(role) => Ok(MaybePrincipal(Some(Principal { id, username, role }))),
            Err(()) => {
                tracing::warn!("Ignoring principal {} with unknown role '{}'", id, role);
                Ok(MaybePrincipal(None))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Forbidden resource")]
    Forbidden,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = match self {
            AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden => StatusCode::FORBIDDEN,
        };
        let body = serde_json::json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Require an authenticated caller holding one of `allowed`
pub fn require_role<'a>(
    principal: Option<&'a Principal>,
    allowed: &[Role],
) -> Result<&'a Principal, AccessError> {
    let principal = principal.ok_or(AccessError::Unauthenticated)?;
    if allowed.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(AccessError::Forbidden)
    }
}
