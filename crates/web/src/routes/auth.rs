//! Authentication route handlers.
//!
//! Credentials are checked by the booking API; this site only keeps the
//! returned user record in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use staybook_core::session::CurrentUser;

use crate::filters;
use crate::middleware::{sign_in, sign_out};
use crate::routes::wishlist::refresh_wishlist;
use crate::state::AppState;

const LOGIN_FAILED_MESSAGE: &str = "Login failed";
const SIGNUP_FAILED_MESSAGE: &str = "Signup failed";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Signup form data.
#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub name: String,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub user: Option<CurrentUser>,
    pub username: String,
    pub name: String,
    pub error: Option<String>,
}

/// Only same-site absolute paths are followed after sign-in. Browsers read
/// `/\host` like `//host`, so a backslash after the leading slash is
/// refused too.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/dashboard",
    }
}

async fn start_session(state: &AppState, session: &Session, user: &CurrentUser) -> bool {
    if let Err(e) = sign_in(session, user).await {
        tracing::error!("Failed to set session: {e}");
        return false;
    }
    refresh_wishlist(state, session, &user.username).await;
    true
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        user: None,
        username: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();
    let password = SecretString::from(form.password);

    let error = match state.api().login(form.username.trim(), &password).await {
        Ok(user) => {
            if start_session(&state, &session, &user).await {
                return Redirect::to(&next).into_response();
            }
            LOGIN_FAILED_MESSAGE.to_string()
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            e.user_message(LOGIN_FAILED_MESSAGE)
        }
    };

    LoginTemplate {
        user: None,
        username: form.username,
        next,
        error: Some(error),
    }
    .into_response()
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
pub async fn signup_page() -> impl IntoResponse {
    SignupTemplate {
        user: None,
        username: String::new(),
        name: String::new(),
        error: None,
    }
}

/// Handle signup form submission. A new account is signed in immediately.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let username = form.username.trim();
    let name = form.name.trim();

    let error = if username.is_empty() || name.is_empty() || form.password.is_empty() {
        "Username, password, and name are required".to_string()
    } else {
        let password = SecretString::from(form.password.clone());
        match state.api().signup(username, &password, name).await {
            Ok(user) => {
                if start_session(&state, &session, &user).await {
                    return Redirect::to("/dashboard").into_response();
                }
                SIGNUP_FAILED_MESSAGE.to_string()
            }
            Err(e) => {
                tracing::warn!("Signup failed: {e}");
                e.user_message(SIGNUP_FAILED_MESSAGE)
            }
        }
    };

    SignupTemplate {
        user: None,
        username: username.to_string(),
        name: name.to_string(),
        error: Some(error),
    }
    .into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout. Drops the whole session.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = sign_out(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/bookings")), "/bookings");
        assert_eq!(safe_next(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("/\\evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("/\t/evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("/hotels/2/book")), "/hotels/2/book");
        assert_eq!(safe_next(None), "/dashboard");
    }
}
