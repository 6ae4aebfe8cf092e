//! Authentication extractors and the session's user mutation points.
//!
//! The signed-in user is read through [`RequireAuth`] / [`OptionalAuth`] and
//! written only through [`sign_in`], [`replace_current_user`], and
//! [`sign_out`].

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use staybook_core::session::CurrentUser;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::keys;

/// Extractor that requires a signed-in user.
///
/// Page requests are redirected to the login page; HTMX requests get a 401
/// with an `HX-Redirect` header so the whole page navigates.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a signed-in user is required.
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin(String),
    /// Unauthorized response (for HTMX requests).
    Unauthorized(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(login) => Redirect::to(&login).into_response(),
            Self::Unauthorized(login) => (
                StatusCode::UNAUTHORIZED,
                AppendHeaders([("HX-Redirect", login)]),
            )
                .into_response(),
        }
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
}

/// Login URL that returns to `path` after signing in.
#[must_use]
pub fn login_url(path: &str) -> String {
    format!("/auth/login?next={}", urlencoding::encode(path))
}

/// Fetch the signed-in user from a session, treating read errors as signed out.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    match session.get::<CurrentUser>(keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Failed to read current user from session: {e}");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.0.path());
        let login = login_url(path);
        let reject = || {
            if is_htmx(&parts.headers) {
                AuthRejection::Unauthorized(login.clone())
            } else {
                AuthRejection::RedirectToLogin(login.clone())
            }
        };

        // Set by SessionManagerLayer
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(reject());
        };

        current_user(session).await.map(Self).ok_or_else(reject)
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject signed-out requests.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Start a signed-in session for `user`.
///
/// The session ID is rotated first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.username);
    tracing::info!(username = %user.username, "User signed in");
    Ok(())
}

/// Replace the stored user after a profile update.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn replace_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_USER, user).await
}

/// End the session: user, booking draft, and wishlist are all dropped.
///
/// # Errors
///
/// Returns an error if the session cannot be cleared.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_login_url_encodes_return_path() {
        assert_eq!(login_url("/bookings/history"), "/auth/login?next=%2Fbookings%2Fhistory");
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_htmx_rejection_is_unauthorized_with_redirect_header() {
        let response = AuthRejection::Unauthorized("/auth/login".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("HX-Redirect").map(HeaderValue::as_bytes),
            Some(b"/auth/login".as_slice())
        );
    }

    #[test]
    fn test_page_rejection_redirects() {
        let response = AuthRejection::RedirectToLogin("/auth/login".to_string()).into_response();
        assert!(response.status().is_redirection());
    }
}
