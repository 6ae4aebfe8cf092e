//! Wishlist route handlers.
//!
//! The heart button is an HTMX toggle. Membership is kept in the session and
//! flipped before the remote call is made; a failed remote call is logged and
//! not rolled back, so the session set can drift from the booking API until
//! the next sign-in or wishlist page load.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use staybook_core::session::CurrentUser;
use staybook_core::wishlist::{Wishlist, WishlistChange};
use staybook_core::{HotelId, Username};

use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, keys};
use crate::routes::hotels::HotelCard;
use crate::routes::MessageQuery;
use crate::state::AppState;

const REMOVE_FAILED_MESSAGE: &str = "Failed to remove from wishlist";

// =============================================================================
// Session Helpers
// =============================================================================

/// The saved set held in the session; empty when signed out or unreadable.
pub(crate) async fn load_wishlist(session: &Session) -> Wishlist {
    match session.get::<Wishlist>(keys::WISHLIST).await {
        Ok(wishlist) => wishlist.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read wishlist from session: {e}");
            Wishlist::default()
        }
    }
}

async fn store_wishlist(
    session: &Session,
    wishlist: &Wishlist,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::WISHLIST, wishlist).await
}

/// Replace the session set with the booking API's. On failure the session
/// set is left as it was.
pub(crate) async fn refresh_wishlist(state: &AppState, session: &Session, username: &Username) {
    match state.api().wishlist(username).await {
        Ok(contents) => {
            let wishlist = Wishlist::from_ids(contents.hotel_ids);
            if let Err(e) = store_wishlist(session, &wishlist).await {
                tracing::error!("Failed to save wishlist to session: {e}");
            }
        }
        Err(e) => tracing::warn!("Failed to load wishlist: {e}"),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub hotel_id: HotelId,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/wishlist.html")]
pub struct WishlistTemplate {
    pub user: Option<CurrentUser>,
    pub hotels: Vec<HotelCard>,
    pub error: Option<String>,
}

/// Heart button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub hotel_id: HotelId,
    pub saved: bool,
}

/// Sign-in prompt shown in place of the heart when signed out (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/login_prompt.html")]
pub struct LoginPromptTemplate {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the saved hotels.
#[instrument(skip(state, session, user), fields(username = %user.username))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let hotels = match state.api().wishlist(&user.username).await {
        Ok(contents) => {
            let wishlist = Wishlist::from_ids(contents.hotel_ids);
            if let Err(e) = store_wishlist(&session, &wishlist).await {
                tracing::error!("Failed to save wishlist to session: {e}");
            }
            HotelCard::from_listings(&contents.hotels, &wishlist)
        }
        Err(e) => {
            tracing::warn!("Failed to load wishlist: {e}");
            Vec::new()
        }
    };

    WishlistTemplate {
        user: Some(user),
        hotels,
        error: query.error,
    }
}

/// Flip a hotel's saved state (HTMX).
///
/// Signed out: returns a sign-in prompt, sends nothing, and leaves the set
/// unchanged. Signed in: updates the session set, then sends the matching
/// add or remove request; failure is only logged.
#[instrument(skip(state, session, user))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<ToggleForm>,
) -> Response {
    let Some(user) = user else {
        return LoginPromptTemplate {
            message: "Sign in to save hotels",
        }
        .into_response();
    };

    let mut wishlist = load_wishlist(&session).await;
    let change = wishlist.toggle(&form.hotel_id);
    if let Err(e) = store_wishlist(&session, &wishlist).await {
        tracing::error!("Failed to save wishlist to session: {e}");
    }

    let result = match change {
        WishlistChange::Added => {
            state
                .api()
                .add_to_wishlist(&user.username, &form.hotel_id)
                .await
        }
        WishlistChange::Removed => {
            state
                .api()
                .remove_from_wishlist(&user.username, &form.hotel_id)
                .await
        }
    };
    if let Err(e) = result {
        tracing::warn!(hotel_id = %form.hotel_id, ?change, "Wishlist update failed: {e}");
    }

    (
        AppendHeaders([("HX-Trigger", "wishlist-updated")]),
        WishlistButtonTemplate {
            saved: wishlist.contains(&form.hotel_id),
            hotel_id: form.hotel_id,
        },
    )
        .into_response()
}

/// Remove a hotel from the wishlist page. Not optimistic: the session set
/// changes only after the booking API confirms.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(hotel_id): Path<HotelId>,
) -> Redirect {
    match state
        .api()
        .remove_from_wishlist(&user.username, &hotel_id)
        .await
    {
        Ok(()) => {
            let mut wishlist = load_wishlist(&session).await;
            wishlist.remove(&hotel_id);
            if let Err(e) = store_wishlist(&session, &wishlist).await {
                tracing::error!("Failed to save wishlist to session: {e}");
            }
            Redirect::to("/wishlist")
        }
        Err(e) => {
            tracing::warn!(hotel_id = %hotel_id, "Failed to remove from wishlist: {e}");
            Redirect::to(&format!(
                "/wishlist?error={}",
                urlencoding::encode(REMOVE_FAILED_MESSAGE)
            ))
        }
    }
}
