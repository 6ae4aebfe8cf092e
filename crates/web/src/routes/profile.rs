//! Profile route handlers: contact details and password change.

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

use staybook_core::Email;
use staybook_core::session::CurrentUser;

use crate::api::ProfileUpdate;
use crate::filters;
use crate::middleware::{RequireAuth, replace_current_user};
use crate::routes::MessageQuery;
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Password change form data.
#[derive(Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub initials: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ProfileTemplate {
    fn for_user(user: CurrentUser, error: Option<String>, success: Option<String>) -> Self {
        Self {
            initials: user.initials(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            user: Some(user),
            error,
            success,
        }
    }
}

/// Check the password form before anything is sent.
fn validate_password_change(form: &PasswordForm) -> Result<(), &'static str> {
    if form.new_password != form.confirm_password {
        return Err("New passwords don't match");
    }
    if form.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

fn redirect_with(key: &str, message: &str) -> Redirect {
    Redirect::to(&format!("/profile?{key}={}", urlencoding::encode(message)))
}

/// Display the profile page.
#[instrument(skip(user))]
pub async fn show(RequireAuth(user): RequireAuth, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    ProfileTemplate::for_user(user, query.error, query.success)
}

/// Save contact details and refresh the session's user.
#[instrument(skip(state, session, user, form), fields(username = %user.username))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return ProfileTemplate::for_user(user, Some("Name is required".to_string()), None)
            .into_response();
    }

    let email = match Email::parse_optional(&form.email) {
        Ok(email) => email.map(|e| e.as_str().to_string()).unwrap_or_default(),
        Err(e) => {
            return ProfileTemplate::for_user(user, Some(e.to_string()), None).into_response();
        }
    };

    let update = ProfileUpdate {
        name: name.to_string(),
        email,
        phone: form.phone.trim().to_string(),
    };

    match state.api().update_profile(&user.username, &update).await {
        Ok(updated) => {
            if let Err(e) = replace_current_user(&session, &updated).await {
                tracing::error!("Failed to save updated user to session: {e}");
            }
            redirect_with("success", "Profile updated successfully!").into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to update profile: {e}");
            redirect_with("error", "Failed to update profile").into_response()
        }
    }
}

/// Change the password. Mismatched or short new passwords are rejected
/// without contacting the booking API.
#[instrument(skip(state, user, form), fields(username = %user.username))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Redirect {
    if let Err(message) = validate_password_change(&form) {
        return redirect_with("error", message);
    }

    let current = SecretString::from(form.current_password);
    let new = SecretString::from(form.new_password);

    match state
        .api()
        .update_password(&user.username, &current, &new)
        .await
    {
        Ok(()) => redirect_with("success", "Password updated successfully!"),
        Err(e) => {
            tracing::warn!("Failed to update password: {e}");
            redirect_with("error", &e.user_message("Failed to update password"))
        }
    }
}
