//! Authentication extractors
//!
//! Resolve the acting user from a bearer token or `session` cookie.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::session::{Session, verify_session_token};
use crate::AppState;
use crate::error::AppError;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get("session").map(|cookie| cookie.value().to_owned())
        })
}

/// Verify the token and require that its user still exists.
///
/// Sessions older than `auth.session_max_age` are rejected even when the
/// token itself has not expired yet.
async fn authenticate_token(token: &str, state: &AppState) -> Result<Session, AppError> {
    let session = verify_session_token(token, &state.config.auth.session_secret)?;

    if session.exceeds_max_age(state.config.auth.session_max_age) {
        tracing::debug!(user_id = %session.user_id, "Session older than session_max_age");
        return Err(AppError::Unauthorized);
    }

    if !state.db.user_exists(&session.user_id).await? {
        tracing::debug!(user_id = %session.user_id, "Session for unknown user");
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

/// Extractor for current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentUser(session));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = authenticate_token(&token, &state).await?;
        parts.extensions.insert(session.clone());

        Ok(CurrentUser(session))
    }
}

/// Optional current user extractor
///
/// A missing or invalid token yields `None`. Store failures while checking
/// the token are still returned as errors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|session| session.user_id.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(MaybeUser(Some(session)));
        }

        let app_state = AppState::from_ref(state);
        let session = match extract_token_from_headers(&parts.headers) {
            Some(token) => {
                anonymous_if_unauthorized(authenticate_token(&token, &app_state).await)?
            }
            None => None,
        };

        if let Some(session) = &session {
            parts.extensions.insert(session.clone());
        }

        Ok(MaybeUser(session))
    }
}

/// Treat an unusable token as no token; keep every other failure.
fn anonymous_if_unauthorized(
    result: Result<Session, AppError>,
) -> Result<Option<Session>, AppError> {
    match result {
        Ok(session) => Ok(Some(session)),
        Err(AppError::Unauthorized) => Ok(None),
        Err(error) => Err(error),
    }
}
