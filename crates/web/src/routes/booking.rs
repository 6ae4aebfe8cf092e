//! Booking route handlers.
//!
//! The draft is kept in the session. The booking page creates it, the quote
//! fragment (HTMX) updates room, dates, and guests as the user types, and the
//! submit handler turns it into exactly one booking request.
//!
//! Card fields are never stored in the session. After a failed submission the
//! number, expiry, and holder are put back into the form; CVC and card
//! password must be typed again.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use staybook_core::booking::{BOOKING_FAILED_MESSAGE, BookingDraft, PaymentDetails};
use staybook_core::catalog::Listing;
use staybook_core::pricing;
use staybook_core::session::CurrentUser;
use staybook_core::{HotelId, Money};

use crate::api::BookingConfirmation;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::auth::login_url;
use crate::middleware::{OptionalAuth, RequireAuth, keys};
use crate::state::AppState;

const STALE_DRAFT_MESSAGE: &str = "This booking form has expired. Reload the page and try again.";

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_draft(session: &Session) -> Option<BookingDraft> {
    session
        .get::<BookingDraft>(keys::BOOKING_DRAFT)
        .await
        .ok()
        .flatten()
}

async fn store_draft(
    session: &Session,
    draft: &BookingDraft,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(keys::BOOKING_DRAFT, draft).await
}

// =============================================================================
// Views
// =============================================================================

/// Quote and guest selector state for templates.
#[derive(Clone)]
pub struct QuoteView {
    pub draft_id: String,
    pub nightly_price: Money,
    pub nights: u32,
    pub total: Money,
    pub valid: bool,
    pub dates_entered: bool,
    pub guests: u32,
    pub guest_options: Vec<GuestOption>,
    pub signed_in: bool,
    pub can_submit: bool,
}

/// One entry of the guest selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestOption {
    pub count: u32,
    pub selected: bool,
}

impl QuoteView {
    fn from_draft(draft: &BookingDraft, signed_in: bool) -> Self {
        let quote = draft.quote();
        let capacity = draft.room().map_or(1, Listing::capacity);
        let guests = draft.guests();

        Self {
            draft_id: draft.id().to_string(),
            nightly_price: draft.room().map_or(Money::ZERO, |r| r.nightly_price),
            nights: quote.nights,
            total: quote.total,
            valid: quote.is_valid(),
            dates_entered: draft.check_in().is_some() && draft.check_out().is_some(),
            guests,
            guest_options: pricing::guest_options(capacity)
                .into_iter()
                .map(|count| GuestOption {
                    count,
                    selected: count == guests,
                })
                .collect(),
            signed_in,
            can_submit: signed_in && draft.can_submit(),
        }
    }
}

/// Non-secret card fields echoed back after a failed submission.
#[derive(Clone, Default)]
pub struct PaymentFormView {
    pub card_number: String,
    pub card_expiration: String,
    pub card_holder: String,
}

/// Booking page template.
#[derive(Template, WebTemplate)]
#[template(path = "hotels/book.html")]
pub struct BookingTemplate {
    pub user: Option<CurrentUser>,
    pub room: Listing,
    pub rooms: Vec<Listing>,
    pub check_in: String,
    pub check_out: String,
    pub min_date: String,
    pub quote: QuoteView,
    pub payment: PaymentFormView,
    pub error: Option<String>,
    pub quote_error: Option<String>,
}

/// Quote fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quote.html")]
pub struct QuoteTemplate {
    pub quote: QuoteView,
    pub quote_error: Option<String>,
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "bookings/confirmation.html")]
pub struct ConfirmationTemplate {
    pub user: Option<CurrentUser>,
    pub confirmation: BookingConfirmation,
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()
}

fn parse_guests(value: Option<&str>) -> u32 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(1)
}

impl BookingTemplate {
    fn new(
        user: Option<CurrentUser>,
        room: Listing,
        rooms: Vec<Listing>,
        draft: &BookingDraft,
        payment: PaymentFormView,
        error: Option<String>,
    ) -> Self {
        let signed_in = user.is_some();
        Self {
            user,
            room,
            rooms,
            check_in: format_date(draft.check_in()),
            check_out: format_date(draft.check_out()),
            min_date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            quote: QuoteView::from_draft(draft, signed_in),
            payment,
            error,
            quote_error: None,
        }
    }
}

/// Every room of the hotel `room` belongs to, with `room` first if the
/// lookup fails or does not include it.
async fn rooms_of(state: &AppState, room: &Listing) -> Vec<Listing> {
    let mut rooms = state.api().get_rooms(&room.name).await.unwrap_or_else(|e| {
        tracing::warn!(hotel = %room.name, "Failed to load rooms: {e}");
        Vec::new()
    });
    if !rooms.iter().any(|r| r.id == room.id) {
        rooms.insert(0, room.clone());
    }
    rooms
}

// =============================================================================
// Form Types
// =============================================================================

/// Quote fragment query (HTMX `hx-include` of the booking form).
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub room_id: Option<HotelId>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<String>,
}

/// Booking form data.
///
/// No `Debug`: the form carries card data.
#[derive(Deserialize)]
pub struct BookingForm {
    pub draft_id: Uuid,
    pub room_id: HotelId,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<String>,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_expiration: String,
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_cvc: String,
    #[serde(default)]
    pub card_password: String,
}

impl BookingForm {
    fn split_payment(self) -> (PaymentFormView, PaymentDetails) {
        let echo = PaymentFormView {
            card_number: self.card_number.clone(),
            card_expiration: self.card_expiration.clone(),
            card_holder: self.card_holder.clone(),
        };
        let payment = PaymentDetails {
            card_number: SecretString::from(self.card_number),
            card_expiration: self.card_expiration,
            card_holder: self.card_holder,
            card_cvc: SecretString::from(self.card_cvc),
            card_password: SecretString::from(self.card_password),
        };
        (echo, payment)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the booking page for a listing and start a fresh draft.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(hotel_id): Path<HotelId>,
) -> Result<Response> {
    let room = state.api().get_hotel(&hotel_id).await?;
    let rooms = rooms_of(&state, &room).await;

    let mut draft = BookingDraft::new();
    draft
        .select_room(room.clone())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store_draft(&session, &draft).await?;

    Ok(BookingTemplate::new(
        user,
        room,
        rooms,
        &draft,
        PaymentFormView::default(),
        None,
    )
    .into_response())
}

/// Recompute the quote and guest selector (HTMX).
#[instrument(skip(state, session, user))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<QuoteQuery>,
) -> Result<Response> {
    let Some(mut draft) = load_draft(&session).await else {
        return Err(AppError::BadRequest(STALE_DRAFT_MESSAGE.to_string()));
    };

    let error = apply_selection(
        &state,
        &mut draft,
        query.room_id.as_ref(),
        parse_date(query.check_in.as_deref()),
        parse_date(query.check_out.as_deref()),
        parse_guests(query.guests.as_deref()),
    )
    .await;
    store_draft(&session, &draft).await?;

    Ok(QuoteTemplate {
        quote: QuoteView::from_draft(&draft, user.is_some()),
        quote_error: error,
    }
    .into_response())
}

/// Apply the form's room, dates, and guests to the draft. Returns a message
/// when the draft cannot be edited or the room cannot be loaded.
async fn apply_selection(
    state: &AppState,
    draft: &mut BookingDraft,
    room_id: Option<&HotelId>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guests: u32,
) -> Option<String> {
    if let Some(room_id) = room_id
        && draft.room().is_none_or(|r| &r.id != room_id)
    {
        match state.api().get_hotel(room_id).await {
            Ok(room) => {
                if let Err(e) = draft.select_room(room) {
                    return Some(e.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(room_id = %room_id, "Failed to load room: {e}");
                return Some(e.user_message("Failed to load room"));
            }
        }
    }

    draft
        .set_dates(check_in, check_out)
        .and_then(|()| draft.set_guests(guests))
        .err()
        .map(|e| e.to_string())
}

/// Submit the booking.
///
/// A signed-out submit is sent to the login page, which returns to this
/// hotel's booking page afterwards. A second submit of the same draft while the first is still in flight is
/// answered with 409 and sends nothing. Validation errors and booking API
/// rejections re-render the page with the message; the draft is kept so the
/// user can correct it and resubmit.
#[instrument(skip(state, session, user, form), fields(username = tracing::field::Empty))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<BookingForm>,
) -> Result<Response> {
    let Some(user) = user else {
        let back = format!("/hotels/{}/book", form.room_id);
        return Ok(Redirect::to(&login_url(&back)).into_response());
    };
    tracing::Span::current().record("username", tracing::field::display(&user.username));

    let Some(mut draft) = load_draft(&session).await else {
        return Err(AppError::BadRequest(STALE_DRAFT_MESSAGE.to_string()));
    };
    if draft.id() != form.draft_id {
        return Err(AppError::BadRequest(STALE_DRAFT_MESSAGE.to_string()));
    }

    let Some(_ticket) = state.submissions().try_begin(draft.id()) else {
        tracing::info!(draft_id = %draft.id(), "Duplicate booking submission refused");
        return Err(AppError::Conflict(
            "This booking is already being submitted".to_string(),
        ));
    };

    let check_in = parse_date(form.check_in.as_deref());
    let check_out = parse_date(form.check_out.as_deref());
    let guests = parse_guests(form.guests.as_deref());
    let room_id = form.room_id.clone();
    let (echo, payment) = form.split_payment();

    let selection_error =
        apply_selection(&state, &mut draft, Some(&room_id), check_in, check_out, guests).await;

    let request = match selection_error {
        Some(message) => Err(message),
        None => draft
            .begin_submission(&user, payment)
            .map_err(|e| e.to_string()),
    };

    let request = match request {
        Ok(request) => request,
        Err(message) => {
            store_draft(&session, &draft).await?;
            return render_with_error(&state, Some(user), &draft, echo, message).await;
        }
    };
    store_draft(&session, &draft).await?;

    add_breadcrumb(
        "booking",
        "Submitted booking",
        Some(&[("hotel_id", request.hotel_id.as_str())]),
    );

    match state.api().create_booking(&request).await {
        Ok(confirmation) => {
            draft.confirm();
            session
                .remove::<BookingDraft>(keys::BOOKING_DRAFT)
                .await?;
            session
                .insert(keys::LAST_CONFIRMATION, &confirmation)
                .await?;
            Ok(Redirect::to("/book/confirmation").into_response())
        }
        Err(e) => {
            tracing::warn!(draft_id = %draft.id(), "Booking failed: {e}");
            let message = e.user_message(BOOKING_FAILED_MESSAGE);
            draft.fail(message.clone());
            store_draft(&session, &draft).await?;
            render_with_error(&state, Some(user), &draft, echo, message).await
        }
    }
}

async fn render_with_error(
    state: &AppState,
    user: Option<CurrentUser>,
    draft: &BookingDraft,
    payment: PaymentFormView,
    message: String,
) -> Result<Response> {
    let room = draft
        .room()
        .cloned()
        .ok_or_else(|| AppError::BadRequest(STALE_DRAFT_MESSAGE.to_string()))?;
    let rooms = rooms_of(state, &room).await;

    Ok(BookingTemplate::new(user, room, rooms, draft, payment, Some(message)).into_response())
}

/// Display the last confirmed booking.
#[instrument(skip(session, user))]
pub async fn confirmation(session: Session, RequireAuth(user): RequireAuth) -> Response {
    match session
        .get::<BookingConfirmation>(keys::LAST_CONFIRMATION)
        .await
        .ok()
        .flatten()
    {
        Some(confirmation) => ConfirmationTemplate {
            user: Some(user),
            confirmation,
        }
        .into_response(),
        None => Redirect::to("/bookings").into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;
    use staybook_core::types::Availability;

    use super::*;

    fn room(capacity: u32) -> Listing {
        Listing {
            id: HotelId::new("134"),
            name: "Grand Plaza".to_string(),
            city: "Vienna".to_string(),
            room_type: "deluxe".to_string(),
            nightly_price: Money::from_cents(10_000),
            capacity,
            available: Availability::Yes,
            rating: Decimal::new(46, 1),
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-06-01")),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("06/01/2025")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_parse_guests_defaults_to_one() {
        assert_eq!(parse_guests(Some("3")), 3);
        assert_eq!(parse_guests(Some("")), 1);
        assert_eq!(parse_guests(Some("-2")), 1);
        assert_eq!(parse_guests(None), 1);
    }

    #[test]
    fn test_quote_view_for_valid_range() {
        let mut draft = BookingDraft::new();
        draft.select_room(room(3)).unwrap();
        draft
            .set_dates(parse_date(Some("2025-06-01")), parse_date(Some("2025-06-04")))
            .unwrap();

        let view = QuoteView::from_draft(&draft, true);
        assert_eq!(view.nights, 3);
        assert_eq!(view.total, Money::from_cents(30_000));
        let counts: Vec<_> = view.guest_options.iter().map(|o| o.count).collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert!(view.guest_options[0].selected);
        assert!(view.can_submit);
    }

    #[test]
    fn test_quote_view_for_equal_dates() {
        let mut draft = BookingDraft::new();
        draft.select_room(room(2)).unwrap();
        draft
            .set_dates(parse_date(Some("2025-06-01")), parse_date(Some("2025-06-01")))
            .unwrap();

        let view = QuoteView::from_draft(&draft, true);
        assert_eq!(view.nights, 0);
        assert!(view.dates_entered);
        assert!(!view.valid);
        assert!(!view.can_submit);
    }

    #[test]
    fn test_quote_view_signed_out_cannot_submit() {
        let mut draft = BookingDraft::new();
        draft.select_room(room(2)).unwrap();
        draft
            .set_dates(parse_date(Some("2025-06-01")), parse_date(Some("2025-06-03")))
            .unwrap();

        let view = QuoteView::from_draft(&draft, false);
        assert!(view.valid);
        assert!(!view.signed_in);
        assert!(!view.can_submit);
    }

    #[test]
    fn test_quote_view_after_failed_submission_can_resubmit() {
        let mut draft = BookingDraft::new();
        draft.select_room(room(2)).unwrap();
        draft
            .set_dates(parse_date(Some("2025-06-01")), parse_date(Some("2025-06-04")))
            .unwrap();
        let user = CurrentUser {
            username: staybook_core::Username::new("alice"),
            name: "Alice".to_string(),
            email: String::new(),
            phone: String::new(),
        };
        let payment = PaymentDetails {
            card_number: SecretString::from("4111111111111111"),
            card_expiration: "12/30".to_string(),
            card_holder: "Alice Example".to_string(),
            card_cvc: SecretString::from("123"),
            card_password: SecretString::from("12"),
        };
        draft.begin_submission(&user, payment).unwrap();
        draft.fail("Invalid card details");

        assert!(QuoteView::from_draft(&draft, true).can_submit);
    }

    #[test]
    fn test_split_payment_echoes_only_public_fields() {
        let form = BookingForm {
            draft_id: Uuid::new_v4(),
            room_id: HotelId::new("134"),
            check_in: None,
            check_out: None,
            guests: None,
            card_number: "4111111111111111".to_string(),
            card_expiration: "12/26".to_string(),
            card_holder: "ADA".to_string(),
            card_cvc: "123".to_string(),
            card_password: "hunter2".to_string(),
        };
        let (echo, payment) = form.split_payment();
        assert_eq!(echo.card_holder, "ADA");
        assert!(payment.missing_field().is_none());
    }
}
