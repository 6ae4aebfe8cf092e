//! Booking drafts, the request they produce, and the records the booking API
//! returns.
//!
//! # Draft lifecycle
//!
//! ```text
//! SelectingRoom -> ChoosingDates -> Quoting { valid } -> Submitting -> Confirmed
//!                        ^                                   |
//!                        +------------- fail() --------------+
//! ```
//!
//! A draft produces exactly one [`BookingRequest`] per submission attempt.
//! While it is `Submitting`, a second [`BookingDraft::begin_submission`] is
//! refused. After a failure the draft keeps its room, dates, and guests so the
//! user can correct the payment fields and try again.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::Listing;
use crate::pricing::{self, Quote};
use crate::session::CurrentUser;
use crate::types::{BookingId, BookingStatus, HotelId, Money, Username};

/// Message shown when a booking fails without a server-provided detail.
pub const BOOKING_FAILED_MESSAGE: &str = "Booking failed";

/// Where a draft is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftState {
    SelectingRoom,
    ChoosingDates,
    Quoting { valid: bool },
    Submitting,
    Confirmed,
}

/// Reasons a draft cannot be changed or submitted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("a booking for this draft is already being submitted")]
    SubmissionInFlight,
    #[error("this booking has already been confirmed")]
    AlreadyConfirmed,
    #[error("select a room first")]
    NoRoomSelected,
    #[error("this room is not available")]
    RoomUnavailable,
    #[error("check-out must be at least one night after check-in")]
    InvalidDates,
    #[error("this room sleeps at most {capacity} guests")]
    TooManyGuests { capacity: u32 },
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Card data typed into the booking form.
///
/// The values are forwarded verbatim to the booking API and only checked for
/// presence. Card number, CVC, and card password never appear in `Debug`
/// output or logs.
pub struct PaymentDetails {
    pub card_number: SecretString,
    pub card_expiration: String,
    pub card_holder: String,
    pub card_cvc: SecretString,
    pub card_password: SecretString,
}

impl PaymentDetails {
    /// Name of the first blank field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("card number", self.card_number.expose_secret().trim().is_empty()),
            ("card expiration", self.card_expiration.trim().is_empty()),
            ("card holder", self.card_holder.trim().is_empty()),
            ("CVC", self.card_cvc.expose_secret().trim().is_empty()),
            ("card password", self.card_password.expose_secret().is_empty()),
        ]
        .into_iter()
        .find_map(|(name, blank)| blank.then_some(name))
    }
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &"[REDACTED]")
            .field("card_expiration", &self.card_expiration)
            .field("card_holder", &self.card_holder)
            .field("card_cvc", &"[REDACTED]")
            .field("card_password", &"[REDACTED]")
            .finish()
    }
}

/// An in-progress booking for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    id: Uuid,
    room: Option<Listing>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guests: u32,
    quote: Quote,
    state: DraftState,
    last_error: Option<String>,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingDraft {
    /// Start a new draft with no room selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            room: None,
            check_in: None,
            check_out: None,
            guests: 1,
            quote: Quote::INVALID,
            state: DraftState::SelectingRoom,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn room(&self) -> Option<&Listing> {
        self.room.as_ref()
    }

    #[must_use]
    pub const fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    #[must_use]
    pub const fn check_out(&self) -> Option<NaiveDate> {
        self.check_out
    }

    #[must_use]
    pub const fn guests(&self) -> u32 {
        self.guests
    }

    #[must_use]
    pub const fn quote(&self) -> Quote {
        self.quote
    }

    #[must_use]
    pub const fn state(&self) -> DraftState {
        self.state
    }

    /// Error from the last failed submission, cleared on the next attempt.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the submit button should be enabled: the current dates quote
    /// at least one night for a bookable room, and no submission is in flight
    /// or confirmed. Holds again after a failed attempt with unchanged input.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.ensure_editable().is_ok()
            && self.quote.is_valid()
            && self.room.as_ref().is_some_and(Listing::is_available)
    }

    /// Select (or switch) the room. A guest count above the new room's
    /// capacity resets to one.
    ///
    /// # Errors
    ///
    /// Returns an error while a submission is in flight or once confirmed.
    pub fn select_room(&mut self, room: Listing) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.guests = pricing::clamp_guests(self.guests, room.capacity());
        self.room = Some(room);
        self.recompute();
        Ok(())
    }

    /// Set the stay dates.
    ///
    /// # Errors
    ///
    /// Returns an error while a submission is in flight or once confirmed.
    pub fn set_dates(
        &mut self,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    ) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.check_in = check_in;
        self.check_out = check_out;
        self.recompute();
        Ok(())
    }

    /// Set the guest count, kept within the selected room's capacity.
    ///
    /// # Errors
    ///
    /// Returns an error while a submission is in flight or once confirmed.
    pub fn set_guests(&mut self, guests: u32) -> Result<(), DraftError> {
        self.ensure_editable()?;
        let capacity = self.room.as_ref().map_or(1, Listing::capacity);
        self.guests = pricing::clamp_guests(guests, capacity);
        Ok(())
    }

    /// Check every precondition and move to `Submitting`, returning the one
    /// request to send.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] without changing state if a submission is
    /// already in flight, the draft is confirmed, no bookable room is
    /// selected, the dates quote zero nights, the guests exceed capacity, or
    /// a payment field is blank.
    pub fn begin_submission(
        &mut self,
        user: &CurrentUser,
        payment: PaymentDetails,
    ) -> Result<BookingRequest, DraftError> {
        self.ensure_editable()?;
        let room = self.room.as_ref().ok_or(DraftError::NoRoomSelected)?;
        if !room.is_available() {
            return Err(DraftError::RoomUnavailable);
        }

        let quote = pricing::quote(room.nightly_price, self.check_in, self.check_out);
        let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) else {
            return Err(DraftError::InvalidDates);
        };
        if !quote.is_valid() {
            return Err(DraftError::InvalidDates);
        }

        if self.guests == 0 || self.guests > room.capacity() {
            return Err(DraftError::TooManyGuests {
                capacity: room.capacity(),
            });
        }

        if let Some(field) = payment.missing_field() {
            return Err(DraftError::MissingField(field));
        }

        let request = BookingRequest {
            username: user.username.clone(),
            hotel_id: room.id.clone(),
            hotel_name: room.name.clone(),
            room_type: room.room_type.clone(),
            check_in,
            check_out,
            guests: self.guests,
            total_price: quote.total.amount(),
            card_number: payment.card_number,
            card_expiration: payment.card_expiration,
            card_holder: payment.card_holder,
            card_cvc: payment.card_cvc,
            card_password: payment.card_password,
        };

        self.quote = quote;
        self.last_error = None;
        self.state = DraftState::Submitting;
        Ok(request)
    }

    /// The booking API accepted the request. Terminal.
    pub fn confirm(&mut self) {
        self.state = DraftState::Confirmed;
    }

    /// The request failed. The draft returns to choosing dates with the error
    /// kept for display; room, dates, and guests are retained.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.state = DraftState::ChoosingDates;
    }

    const fn ensure_editable(&self) -> Result<(), DraftError> {
        match self.state {
            DraftState::Submitting => Err(DraftError::SubmissionInFlight),
            DraftState::Confirmed => Err(DraftError::AlreadyConfirmed),
            _ => Ok(()),
        }
    }

    fn recompute(&mut self) {
        let Some(room) = &self.room else {
            self.quote = Quote::INVALID;
            self.state = DraftState::SelectingRoom;
            return;
        };

        self.quote = pricing::quote(room.nightly_price, self.check_in, self.check_out);
        self.state = if self.check_in.is_none() && self.check_out.is_none() {
            DraftState::ChoosingDates
        } else {
            DraftState::Quoting {
                valid: self.quote.is_valid(),
            }
        };
    }
}

/// Body of the create-booking request.
#[derive(Serialize)]
pub struct BookingRequest {
    pub username: Username,
    pub hotel_id: HotelId,
    pub hotel_name: String,
    pub room_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    #[serde(serialize_with = "expose")]
    pub card_number: SecretString,
    pub card_expiration: String,
    pub card_holder: String,
    #[serde(serialize_with = "expose")]
    pub card_cvc: SecretString,
    #[serde(serialize_with = "expose")]
    pub card_password: SecretString,
}

impl fmt::Debug for BookingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingRequest")
            .field("username", &self.username)
            .field("hotel_id", &self.hotel_id)
            .field("hotel_name", &self.hotel_name)
            .field("room_type", &self.room_type)
            .field("check_in", &self.check_in)
            .field("check_out", &self.check_out)
            .field("guests", &self.guests)
            .field("total_price", &self.total_price)
            .field("card", &"[REDACTED]")
            .finish()
    }
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// A booking as stored by the booking API.
///
/// The API returns every field as text, so numeric fields accept either a
/// JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub username: Username,
    pub hotel_id: HotelId,
    pub hotel_name: String,
    pub room_type: String,
    pub check_in: String,
    pub check_out: String,
    #[serde(deserialize_with = "flexible_u32")]
    pub guests: u32,
    pub total_price: Money,
    pub status: BookingStatus,
    #[serde(default)]
    pub booked_at: String,
}

impl BookingRecord {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

fn flexible_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(u32),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Status tab on the booking history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Only(BookingStatus),
}

impl HistoryFilter {
    /// Parse the `status` query parameter. Unknown values show everything.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse::<BookingStatus>().ok())
            .map_or(Self::All, Self::Only)
    }

    /// The `status` query value for this tab.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    #[must_use]
    pub fn matches(self, record: &BookingRecord) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => record.status == status,
        }
    }

    /// Records shown under this tab, in API order.
    #[must_use]
    pub fn apply(self, records: &[BookingRecord]) -> Vec<BookingRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Per-tab counts for the history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryCounts {
    pub all: usize,
    pub confirmed: usize,
    pub cancelled: usize,
}

impl HistoryCounts {
    #[must_use]
    pub fn tally(records: &[BookingRecord]) -> Self {
        records.iter().fold(
            Self {
                all: records.len(),
                ..Self::default()
            },
            |mut counts, record| {
                match record.status {
                    BookingStatus::Confirmed => counts.confirmed += 1,
                    BookingStatus::Cancelled => counts.cancelled += 1,
                }
                counts
            },
        )
    }
}

/// Account summary shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_bookings: u32,
    pub total_bookings: u32,
    pub total_spent: Money,
    pub wishlist_count: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Availability;

    fn room(capacity: u32, cents: i64) -> Listing {
        Listing {
            id: HotelId::new("134"),
            name: "Grand Plaza".to_owned(),
            city: "Vienna".to_owned(),
            room_type: "deluxe".to_owned(),
            nightly_price: Money::from_cents(cents),
            capacity,
            available: Availability::Yes,
            rating: Decimal::new(48, 1),
        }
    }

    fn user() -> CurrentUser {
        CurrentUser {
            username: Username::new("ada"),
            name: "Ada Lovelace".to_owned(),
            email: String::new(),
            phone: String::new(),
        }
    }

    fn payment() -> PaymentDetails {
        PaymentDetails {
            card_number: SecretString::from("4111111111111111"),
            card_expiration: "12/26".to_owned(),
            card_holder: "ADA LOVELACE".to_owned(),
            card_cvc: SecretString::from("123"),
            card_password: SecretString::from("hunter2"),
        }
    }

    fn date(s: &str) -> Option<NaiveDate> {
        Some(s.parse().unwrap())
    }

    fn quoted_draft() -> BookingDraft {
        let mut draft = BookingDraft::new();
        draft.select_room(room(3, 10_000)).unwrap();
        draft.set_dates(date("2025-06-01"), date("2025-06-04")).unwrap();
        draft.set_guests(2).unwrap();
        draft
    }

    #[test]
    fn test_state_progression() {
        let mut draft = BookingDraft::new();
        assert_eq!(draft.state(), DraftState::SelectingRoom);

        draft.select_room(room(2, 10_000)).unwrap();
        assert_eq!(draft.state(), DraftState::ChoosingDates);

        draft.set_dates(date("2025-06-01"), date("2025-06-01")).unwrap();
        assert_eq!(draft.state(), DraftState::Quoting { valid: false });
        assert!(!draft.can_submit());

        draft.set_dates(date("2025-06-01"), date("2025-06-04")).unwrap();
        assert_eq!(draft.state(), DraftState::Quoting { valid: true });
        assert_eq!(draft.quote().nights, 3);
        assert_eq!(draft.quote().total, Money::from_cents(30_000));
        assert!(draft.can_submit());
    }

    #[test]
    fn test_switching_to_smaller_room_resets_guests() {
        let mut draft = BookingDraft::new();
        draft.select_room(room(4, 10_000)).unwrap();
        draft.set_guests(4).unwrap();
        assert_eq!(draft.guests(), 4);

        draft.select_room(room(2, 10_000)).unwrap();
        assert_eq!(draft.guests(), 1);

        draft.set_guests(2).unwrap();
        draft.select_room(room(3, 10_000)).unwrap();
        assert_eq!(draft.guests(), 2);
    }

    #[test]
    fn test_switching_room_requotes() {
        let mut draft = quoted_draft();
        draft.select_room(room(3, 25_050)).unwrap();
        assert_eq!(draft.quote().total, Money::from_cents(75_150));
    }

    #[test]
    fn test_begin_submission_builds_one_request() {
        let mut draft = quoted_draft();
        let request = draft.begin_submission(&user(), payment()).unwrap();

        assert_eq!(draft.state(), DraftState::Submitting);
        assert_eq!(request.username.as_str(), "ada");
        assert_eq!(request.hotel_id.as_str(), "134");
        assert_eq!(request.guests, 2);
        assert_eq!(request.total_price, Decimal::new(300, 0));

        assert_eq!(
            draft.begin_submission(&user(), payment()).unwrap_err(),
            DraftError::SubmissionInFlight
        );
        assert_eq!(
            draft.set_guests(1).unwrap_err(),
            DraftError::SubmissionInFlight
        );
    }

    #[test]
    fn test_equal_dates_block_submission() {
        let mut draft = quoted_draft();
        draft.set_dates(date("2025-06-01"), date("2025-06-01")).unwrap();
        assert_eq!(
            draft.begin_submission(&user(), payment()).unwrap_err(),
            DraftError::InvalidDates
        );
        assert_eq!(draft.state(), DraftState::Quoting { valid: false });
    }

    #[test]
    fn test_blank_payment_field_blocks_submission() {
        let mut draft = quoted_draft();
        let mut card = payment();
        card.card_cvc = SecretString::from("  ");
        assert_eq!(
            draft.begin_submission(&user(), card).unwrap_err(),
            DraftError::MissingField("CVC")
        );
        assert!(draft.can_submit());
    }

    #[test]
    fn test_unavailable_room_blocks_submission() {
        let mut draft = BookingDraft::new();
        let mut booked = room(2, 10_000);
        booked.available = Availability::No;
        draft.select_room(booked).unwrap();
        draft.set_dates(date("2025-06-01"), date("2025-06-02")).unwrap();
        assert!(!draft.can_submit());
        assert_eq!(
            draft.begin_submission(&user(), payment()).unwrap_err(),
            DraftError::RoomUnavailable
        );
    }

    #[test]
    fn test_failure_keeps_draft_and_allows_retry() {
        let mut draft = quoted_draft();
        draft.begin_submission(&user(), payment()).unwrap();
        draft.fail("Invalid card details");

        assert_eq!(draft.state(), DraftState::ChoosingDates);
        assert_eq!(draft.last_error(), Some("Invalid card details"));
        assert_eq!(draft.guests(), 2);
        assert_eq!(draft.quote().nights, 3);
        assert!(draft.can_submit());

        draft.begin_submission(&user(), payment()).unwrap();
        assert_eq!(draft.last_error(), None);
    }

    #[test]
    fn test_submit_disabled_while_in_flight_and_after_confirm() {
        let mut draft = quoted_draft();
        assert!(draft.can_submit());

        draft.begin_submission(&user(), payment()).unwrap();
        assert!(!draft.can_submit());

        draft.confirm();
        assert!(!draft.can_submit());
    }

    #[test]
    fn test_confirmed_is_terminal() {
        let mut draft = quoted_draft();
        draft.begin_submission(&user(), payment()).unwrap();
        draft.confirm();
        assert_eq!(
            draft.begin_submission(&user(), payment()).unwrap_err(),
            DraftError::AlreadyConfirmed
        );
    }

    #[test]
    fn test_request_wire_format() {
        let mut draft = quoted_draft();
        let request = draft.begin_submission(&user(), payment()).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["check_in"], "2025-06-01");
        assert_eq!(json["check_out"], "2025-06-04");
        assert_eq!(json["total_price"], 300.0);
        assert_eq!(json["card_number"], "4111111111111111");
        assert_eq!(json["card_password"], "hunter2");
    }

    #[test]
    fn test_debug_redacts_card_data() {
        let mut draft = quoted_draft();
        let request = draft.begin_submission(&user(), payment()).unwrap();
        let debug = format!("{request:?} {:?}", payment());
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_draft_survives_session_serialization() {
        let draft = quoted_draft();
        let json = serde_json::to_string(&draft).unwrap();
        let restored: BookingDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, draft);
    }

    fn record(id: &str, status: BookingStatus) -> BookingRecord {
        BookingRecord {
            id: BookingId::new(id),
            username: Username::new("ada"),
            hotel_id: HotelId::new("134"),
            hotel_name: "Grand Plaza".to_owned(),
            room_type: "deluxe".to_owned(),
            check_in: "2025-06-01".to_owned(),
            check_out: "2025-06-04".to_owned(),
            guests: 2,
            total_price: Money::from_cents(30_000),
            status,
            booked_at: "2025-05-20 10:15".to_owned(),
        }
    }

    #[test]
    fn test_record_accepts_text_fields() {
        let json = r#"{"id":"3f2a9c1e","username":"ada","hotel_id":"134",
            "hotel_name":"Grand Plaza","room_type":"deluxe","check_in":"2025-06-01",
            "check_out":"2025-06-04","guests":"2","total_price":"300.0",
            "status":"confirmed","booked_at":"2025-05-20 10:15"}"#;
        let parsed: BookingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, record("3f2a9c1e", BookingStatus::Confirmed));
        assert!(parsed.is_active());
    }

    #[test]
    fn test_history_filter_and_counts() {
        let records = vec![
            record("a", BookingStatus::Confirmed),
            record("b", BookingStatus::Cancelled),
            record("c", BookingStatus::Confirmed),
        ];

        let counts = HistoryCounts::tally(&records);
        assert_eq!(
            counts,
            HistoryCounts {
                all: 3,
                confirmed: 2,
                cancelled: 1
            }
        );

        let cancelled = HistoryFilter::from_param(Some("cancelled")).apply(&records);
        assert_eq!(cancelled.len(), 1);
        assert_eq!(HistoryFilter::from_param(Some("bogus")), HistoryFilter::All);
        assert_eq!(HistoryFilter::from_param(None).apply(&records).len(), 3);
    }
}
