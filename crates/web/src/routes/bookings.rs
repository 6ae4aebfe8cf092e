//! Booking list, cancellation, and history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use staybook_core::BookingId;
use staybook_core::booking::{BookingRecord, HistoryCounts, HistoryFilter};
use staybook_core::session::CurrentUser;

use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::MessageQuery;
use crate::state::AppState;

const CANCEL_FAILED_MESSAGE: &str = "Failed to cancel booking";

/// One history tab.
#[derive(Clone)]
pub struct HistoryTab {
    pub param: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub status: Option<String>,
}

/// Active bookings page template.
#[derive(Template, WebTemplate)]
#[template(path = "bookings/index.html")]
pub struct BookingsTemplate {
    pub user: Option<CurrentUser>,
    pub bookings: Vec<BookingRecord>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Booking history page template.
#[derive(Template, WebTemplate)]
#[template(path = "bookings/history.html")]
pub struct HistoryTemplate {
    pub user: Option<CurrentUser>,
    pub tabs: Vec<HistoryTab>,
    pub bookings: Vec<BookingRecord>,
}

/// Display the signed-in user's active bookings.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let bookings = state
        .api()
        .list_bookings(&user.username)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load bookings: {e}");
            Vec::new()
        });

    BookingsTemplate {
        user: Some(user),
        bookings,
        error: query.error,
        success: query.success,
    }
}

/// Cancel a booking, then return to the list with a banner.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(booking_id): Path<BookingId>,
) -> Redirect {
    match state
        .api()
        .cancel_booking(&booking_id, &user.username)
        .await
    {
        Ok(()) => Redirect::to(&format!(
            "/bookings?success={}",
            urlencoding::encode("Booking cancelled")
        )),
        Err(e) => {
            tracing::warn!(booking_id = %booking_id, "Failed to cancel booking: {e}");
            Redirect::to(&format!(
                "/bookings?error={}",
                urlencoding::encode(CANCEL_FAILED_MESSAGE)
            ))
        }
    }
}

/// Display every booking, filtered by the `status` tab.
#[instrument(skip(state, user), fields(username = %user.username))]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let all = state
        .api()
        .booking_history(&user.username)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load booking history: {e}");
            Vec::new()
        });

    let filter = HistoryFilter::from_param(query.status.as_deref());

    HistoryTemplate {
        user: Some(user),
        tabs: history_tabs(filter, HistoryCounts::tally(&all)),
        bookings: filter.apply(&all),
    }
}

fn history_tabs(active: HistoryFilter, counts: HistoryCounts) -> Vec<HistoryTab> {
    use staybook_core::BookingStatus;

    [
        (HistoryFilter::All, "All", counts.all),
        (
            HistoryFilter::Only(BookingStatus::Confirmed),
            "Confirmed",
            counts.confirmed,
        ),
        (
            HistoryFilter::Only(BookingStatus::Cancelled),
            "Cancelled",
            counts.cancelled,
        ),
    ]
    .into_iter()
    .map(|(filter, label, count)| HistoryTab {
        param: filter.as_param(),
        label,
        count,
        active: filter == active,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_tabs_mark_active_and_count() {
        let counts = HistoryCounts {
            all: 5,
            confirmed: 3,
            cancelled: 2,
        };
        let tabs = history_tabs(HistoryFilter::from_param(Some("cancelled")), counts);

        let summary: Vec<_> = tabs
            .iter()
            .map(|t| (t.param, t.count, t.active))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("all", 5, false),
                ("confirmed", 3, false),
                ("cancelled", 2, true)
            ]
        );
    }
}
