//! Request and response bodies of the booking API.

use serde::{Deserialize, Serialize};

use staybook_core::booking::BookingRecord;
use staybook_core::catalog::Listing;
use staybook_core::session::CurrentUser;
use staybook_core::{BookingId, HotelId, Username};

#[derive(Debug, Deserialize)]
pub(crate) struct HotelsResponse {
    pub hotels: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoomsResponse {
    pub rooms: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookingsResponse {
    pub bookings: Vec<BookingRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub user: CurrentUser,
}

/// Acknowledgement returned by mutations that carry no data.
#[derive(Debug, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub message: String,
}

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    #[serde(default)]
    pub message: String,
    pub booking: BookingRecord,
}

/// Saved hotels with their listing details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WishlistContents {
    #[serde(rename = "wishlist")]
    pub hotels: Vec<Listing>,
    pub hotel_ids: Vec<HotelId>,
}

/// FastAPI error body: `detail` is a string for application errors and a
/// list of objects for validation errors.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        match self.detail {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignupBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Serialize)]
pub(crate) struct PasswordChangeBody<'a> {
    pub username: &'a Username,
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct WishlistBody<'a> {
    pub username: &'a Username,
    pub hotel_id: &'a HotelId,
}

#[derive(Debug, Serialize)]
pub(crate) struct CancelBody<'a> {
    pub booking_id: &'a BookingId,
    pub username: &'a Username,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_string_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Invalid card details"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid card details"));
    }

    #[test]
    fn test_error_body_validation_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["body","guests"],"msg":"field required"}]}"#)
                .unwrap();
        assert_eq!(body.into_message(), None);
    }

    #[test]
    fn test_wishlist_contents() {
        let json = r#"{"wishlist":[{"id":"134","name":"Grand Plaza","city":"Vienna",
            "room_type":"deluxe","price_per_night":120,"capacity":2,"available":"yes",
            "rating":4.6}],"hotel_ids":["134","188"]}"#;
        let contents: WishlistContents = serde_json::from_str(json).unwrap();
        assert_eq!(contents.hotels.len(), 1);
        assert_eq!(contents.hotel_ids.len(), 2);
    }
}
