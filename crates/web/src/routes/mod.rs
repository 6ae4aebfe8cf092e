//! HTTP route handlers for the booking site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page with featured hotels
//! GET  /health                     - Health check
//!
//! # Hotels
//! GET  /hotels                     - Catalog with search, filters, and sort
//! GET  /hotels/{id}/book           - Booking page for a listing
//!
//! # Booking
//! GET  /book/quote                 - Price quote fragment (HTMX)
//! POST /book                       - Submit the current draft
//! GET  /book/confirmation          - Confirmation of the last booking
//!
//! # Bookings (requires auth)
//! GET  /bookings                   - Active bookings
//! POST /bookings/{id}/cancel       - Cancel a booking
//! GET  /bookings/history           - All bookings, tabbed by status
//!
//! # Wishlist
//! GET  /wishlist                   - Saved hotels (requires auth)
//! POST /wishlist/toggle            - Save or unsave (returns button fragment)
//! POST /wishlist/{hotel_id}/remove - Remove from the wishlist page
//!
//! # Account (requires auth)
//! GET  /dashboard                  - Stats and upcoming stays
//! GET  /profile                    - Profile page
//! POST /profile                    - Update contact details
//! POST /profile/password           - Change password
//!
//! # Auth
//! GET  /auth/login                 - Login page
//! POST /auth/login                 - Login action
//! GET  /auth/signup                - Signup page
//! POST /auth/signup                - Signup action
//! POST /auth/logout                - Logout action
//! ```

pub mod auth;
pub mod booking;
pub mod bookings;
pub mod dashboard;
pub mod home;
pub mod hotels;
pub mod profile;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// Banner messages carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the hotel routes router.
pub fn hotel_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(hotels::index))
        .route("/{id}/book", get(booking::show))
}

/// Create the booking flow routes router.
pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(booking::submit))
        .route("/quote", get(booking::quote))
        .route("/confirmation", get(booking::confirmation))
}

/// Create the bookings routes router.
pub fn bookings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(bookings::index))
        .route("/history", get(bookings::history))
        .route("/{id}/cancel", post(bookings::cancel))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/{hotel_id}/remove", post(wishlist::remove))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route("/password", post(profile::update_password))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/hotels", hotel_routes())
        .nest("/book", booking_routes())
        .nest("/bookings", bookings_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/dashboard", get(dashboard::show))
        .nest("/profile", profile_routes())
        .nest("/auth", auth_routes())
}
