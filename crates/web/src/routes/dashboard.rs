//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use staybook_core::booking::{BookingRecord, DashboardStats};
use staybook_core::session::CurrentUser;

use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Number of upcoming bookings listed under the stats.
const RECENT_LIMIT: usize = 3;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/dashboard.html")]
pub struct DashboardTemplate {
    pub user: Option<CurrentUser>,
    pub name: String,
    pub stats: DashboardStats,
    pub recent: Vec<BookingRecord>,
}

/// Display account stats and the first few active bookings.
///
/// Both requests run concurrently; either failing is logged and shown as
/// zeros or an empty list.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let (stats, bookings) = tokio::join!(
        state.api().dashboard_stats(&user.username),
        state.api().list_bookings(&user.username),
    );

    let stats = stats.unwrap_or_else(|e| {
        tracing::warn!("Failed to load dashboard stats: {e}");
        DashboardStats::default()
    });
    let mut recent = bookings.unwrap_or_else(|e| {
        tracing::warn!("Failed to load bookings: {e}");
        Vec::new()
    });
    recent.truncate(RECENT_LIMIT);

    DashboardTemplate {
        name: user.display_name().to_string(),
        user: Some(user),
        stats,
        recent,
    }
}
