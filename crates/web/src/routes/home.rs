//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use staybook_core::session::CurrentUser;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::hotels::HotelCard;
use crate::routes::wishlist::load_wishlist;
use crate::state::AppState;

/// Number of featured hotels shown on the landing page.
const FEATURED_LIMIT: usize = 6;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub featured: Vec<HotelCard>,
}

/// Display the landing page with featured hotels.
///
/// A failed featured-hotels request is logged and the section is left empty.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let mut listings = state.api().featured_hotels().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load featured hotels: {e}");
        Vec::new()
    });
    listings.truncate(FEATURED_LIMIT);

    let wishlist = load_wishlist(&session).await;

    HomeTemplate {
        user,
        featured: HotelCard::from_listings(&listings, &wishlist),
    }
}
