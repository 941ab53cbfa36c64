//! Identity extractors.
//!
//! The session/identity provider sits in front of this service and resolves
//! every caller before the request arrives here, passing the result in
//! trusted headers:
//!
//! - `x-user-id` - stable id of an authenticated user
//! - `x-session-token` - client-held token for an anonymous session
//! - `x-admin-role` - back-office role, set only for admin traffic
//!
//! The extractors collapse those headers into one [`Identity`] value so
//! handlers never branch on credential shape. This service must not be
//! reachable except through the gateway that sets these headers.

use axum::{extract::FromRequestParts, http::request::Parts};

use littlewear_core::Identity;

use crate::error::AppError;

const USER_HEADER: &str = "x-user-id";
const SESSION_HEADER: &str = "x-session-token";
const ADMIN_ROLE_HEADER: &str = "x-admin-role";

/// Roles the back-office gateway may assert.
const ADMIN_ROLES: &[&str] = &["admin", "super_admin"];

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Extractor for any resolved identity - user or anonymous session.
///
/// Rejects with 401 when neither header is present: every cart operation
/// needs *some* identity to key rows by.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     ResolvedIdentity(identity): ResolvedIdentity,
/// ) -> impl IntoResponse {
///     format!("cart for {identity}")
/// }
/// ```
pub struct ResolvedIdentity(pub Identity);

impl<S> FromRequestParts<S> for ResolvedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user_id) = header_value(parts, USER_HEADER) {
            return Ok(Self(Identity::User(user_id)));
        }
        if let Some(token) = header_value(parts, SESSION_HEADER) {
            return Ok(Self(Identity::Anonymous(token)));
        }

        Err(AppError::Unauthorized("no identity resolved".to_string()))
    }
}

/// Extractor that requires an authenticated user.
///
/// Anonymous sessions are rejected with 401; checkout and order history are
/// user-only surfaces.
pub struct RequireUser(pub Identity);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ResolvedIdentity(identity) = ResolvedIdentity::from_request_parts(parts, state).await?;

        if !identity.is_user() {
            return Err(AppError::Unauthorized(
                "a signed-in user is required".to_string(),
            ));
        }

        Ok(Self(identity))
    }
}

/// Extractor that requires a back-office role.
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = header_value(parts, ADMIN_ROLE_HEADER)
            .ok_or_else(|| AppError::Forbidden("admin role required".to_string()))?;

        if !ADMIN_ROLES.contains(&role.as_str()) {
            return Err(AppError::Forbidden(format!("role {role} is not an admin")));
        }

        Ok(Self)
    }
}

/// Whether this request carries an admin role, without rejecting.
#[must_use]
pub fn is_admin(parts: &Parts) -> bool {
    header_value(parts, ADMIN_ROLE_HEADER)
        .is_some_and(|role| ADMIN_ROLES.contains(&role.as_str()))
}

/// Optional admin flag as an extractor (never rejects).
pub struct MaybeAdmin(pub bool);

impl<S> FromRequestParts<S> for MaybeAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(is_admin(parts)))
    }
}
