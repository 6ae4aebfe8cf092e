//! Integration test harness for Staybook.
//!
//! Each test starts two servers on ephemeral ports: an in-memory
//! [`MockBookingApi`] speaking the booking API's JSON, and the real web app
//! pointed at it. Tests drive the web app over HTTP with a cookie-keeping
//! client and then inspect what the mock received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p staybook-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

use staybook_core::catalog::{FilterCriteria, FilterParams, Listing};
use staybook_core::session::CurrentUser;
use staybook_core::{Availability, HotelId, Money, Username};
use staybook_web::config::WebConfig;
use staybook_web::state::AppState;

/// Username of the account every mock starts with.
pub const TEST_USERNAME: &str = "alice";
/// Password of [`TEST_USERNAME`].
pub const TEST_PASSWORD: &str = "secret123";

// =============================================================================
// Fixtures
// =============================================================================

/// Build a listing with whole-dollar pricing.
#[must_use]
pub fn listing(id: &str, name: &str, city: &str, dollars: i64, capacity: u32) -> Listing {
    Listing {
        id: HotelId::new(id),
        name: name.to_string(),
        city: city.to_string(),
        room_type: "standard".to_string(),
        nightly_price: Money::from_cents(dollars * 100),
        capacity,
        available: Availability::Yes,
        rating: "4.2".parse().expect("valid rating"),
    }
}

/// Ten listings across four cities; four of them are in Lisbon.
#[must_use]
pub fn sample_hotels() -> Vec<Listing> {
    let mut hotels = vec![
        listing("1", "Alfama Rooms", "Lisbon", 90, 2),
        listing("2", "Tagus View", "Lisbon", 140, 3),
        listing("3", "Belem Suites", "Lisbon", 210, 4),
        listing("4", "Chiado House", "Lisbon", 120, 2),
        listing("5", "Canal Inn", "Amsterdam", 160, 2),
        listing("6", "Jordaan Lofts", "Amsterdam", 185, 2),
        listing("7", "Ringstrasse Hotel", "Vienna", 130, 2),
        listing("8", "Prater Stay", "Vienna", 75, 1),
        listing("9", "Old Town Hostel", "Prague", 45, 6),
        listing("10", "Castle Hill Hotel", "Prague", 165, 2),
    ];
    if let Some(hotel) = hotels.get_mut(7) {
        hotel.available = Availability::No;
    }
    hotels
}

// =============================================================================
// Mock Booking API
// =============================================================================

/// Requests the mock has served, by endpoint.
#[derive(Debug, Default)]
pub struct RequestCounts {
    pub hotels: AtomicUsize,
    pub book: AtomicUsize,
    pub cancel: AtomicUsize,
    pub wishlist_add: AtomicUsize,
    pub wishlist_remove: AtomicUsize,
}

struct Account {
    password: String,
    user: CurrentUser,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, Account>,
    bookings: Vec<Value>,
    wishlists: HashMap<String, Vec<HotelId>>,
}

struct MockInner {
    hotels: Vec<Listing>,
    store: Mutex<Store>,
    counts: RequestCounts,
    book_delay: Mutex<Option<Duration>>,
    book_rejection: Mutex<Option<String>>,
}

/// In-memory stand-in for the booking API.
#[derive(Clone)]
pub struct MockBookingApi {
    inner: Arc<MockInner>,
}

impl MockBookingApi {
    /// Create a mock serving `hotels` with one registered account.
    #[must_use]
    pub fn new(hotels: Vec<Listing>) -> Self {
        let mut store = Store::default();
        store.accounts.insert(
            TEST_USERNAME.to_string(),
            Account {
                password: TEST_PASSWORD.to_string(),
                user: CurrentUser {
                    username: Username::new(TEST_USERNAME),
                    name: "Alice Example".to_string(),
                    email: "alice@example.com".to_string(),
                    phone: String::new(),
                },
            },
        );

        Self {
            inner: Arc::new(MockInner {
                hotels,
                store: Mutex::new(store),
                counts: RequestCounts::default(),
                book_delay: Mutex::new(None),
                book_rejection: Mutex::new(None),
            }),
        }
    }

    /// Request counters.
    #[must_use]
    pub fn counts(&self) -> &RequestCounts {
        &self.inner.counts
    }

    /// Number of `POST /book` requests received.
    #[must_use]
    pub fn book_requests(&self) -> usize {
        self.inner.counts.book.load(Ordering::SeqCst)
    }

    /// Hold every booking response for `delay`.
    pub fn delay_bookings(&self, delay: Duration) {
        *self.inner.book_delay.lock().expect("lock") = Some(delay);
    }

    /// Reject every booking with a 400 carrying `detail`.
    pub fn reject_bookings(&self, detail: &str) {
        *self.inner.book_rejection.lock().expect("lock") = Some(detail.to_string());
    }

    /// Hotel IDs saved for `username`.
    #[must_use]
    pub fn wishlist_of(&self, username: &str) -> Vec<HotelId> {
        self.inner
            .store
            .lock()
            .expect("lock")
            .wishlists
            .get(username)
            .cloned()
            .unwrap_or_default()
    }

    /// Every booking stored, as sent back to clients.
    #[must_use]
    pub fn bookings(&self) -> Vec<Value> {
        self.inner.store.lock().expect("lock").bookings.clone()
    }

    fn find_hotel(&self, id: &str) -> Option<Listing> {
        self.inner.hotels.iter().find(|h| h.id.as_str() == id).cloned()
    }

    /// Axum router implementing the booking API endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/hotels", get(list_hotels))
            .route("/hotels/featured", get(featured_hotels))
            .route("/hotels/rooms/{name}", get(hotel_rooms))
            .route("/hotels/{id}", get(get_hotel))
            .route("/book", post(book))
            .route("/bookings/history/{username}", get(booking_history))
            .route("/bookings/cancel", post(cancel_booking))
            .route("/bookings/{username}", get(active_bookings))
            .route("/wishlist/add", post(wishlist_add))
            .route("/wishlist/remove", post(wishlist_remove))
            .route("/wishlist/{username}", get(wishlist))
            .route("/auth/login", post(login))
            .route("/auth/signup", post(signup))
            .route("/profile/password/update", put(update_password))
            .route("/profile/{username}", put(update_profile))
            .route("/dashboard/stats/{username}", get(dashboard_stats))
            .with_state(self.clone())
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn list_hotels(
    State(mock): State<MockBookingApi>,
    Query(params): Query<FilterParams>,
) -> Response {
    mock.inner.counts.hotels.fetch_add(1, Ordering::SeqCst);
    match FilterCriteria::from_params(&params) {
        Ok(criteria) => Json(json!({ "hotels": criteria.apply(&mock.inner.hotels) })).into_response(),
        Err(e) => detail(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    }
}

async fn featured_hotels(State(mock): State<MockBookingApi>) -> Json<Value> {
    let featured: Vec<_> = mock.inner.hotels.iter().take(6).collect();
    Json(json!({ "hotels": featured }))
}

async fn get_hotel(State(mock): State<MockBookingApi>, Path(id): Path<String>) -> Response {
    match mock.find_hotel(&id) {
        Some(hotel) => Json(hotel).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Hotel not found"),
    }
}

async fn hotel_rooms(State(mock): State<MockBookingApi>, Path(name): Path<String>) -> Json<Value> {
    let rooms: Vec<_> = mock.inner.hotels.iter().filter(|h| h.name == name).collect();
    Json(json!({ "rooms": rooms }))
}

async fn book(State(mock): State<MockBookingApi>, Json(body): Json<Value>) -> Response {
    mock.inner.counts.book.fetch_add(1, Ordering::SeqCst);

    let delay = *mock.inner.book_delay.lock().expect("lock");
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let rejection = mock.inner.book_rejection.lock().expect("lock").clone();
    if let Some(message) = rejection {
        return detail(StatusCode::BAD_REQUEST, &message);
    }

    let field = |key: &str| match body.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let booking_id = uuid::Uuid::new_v4().simple().to_string();
    let booking = json!({
        "id": booking_id.get(..8).unwrap_or(&booking_id),
        "username": field("username"),
        "hotel_id": field("hotel_id"),
        "hotel_name": field("hotel_name"),
        "room_type": field("room_type"),
        "check_in": field("check_in"),
        "check_out": field("check_out"),
        "guests": field("guests"),
        "total_price": field("total_price"),
        "status": "confirmed",
        "booked_at": "2025-01-01T00:00:00",
    });
    mock.inner
        .store
        .lock()
        .expect("lock")
        .bookings
        .push(booking.clone());

    Json(json!({
        "success": true,
        "message": "Booking confirmed",
        "booking": booking,
    }))
    .into_response()
}

fn bookings_for(mock: &MockBookingApi, username: &str, active_only: bool) -> Vec<Value> {
    mock.inner
        .store
        .lock()
        .expect("lock")
        .bookings
        .iter()
        .filter(|b| b["username"] == username)
        .filter(|b| !active_only || b["status"] == "confirmed")
        .cloned()
        .collect()
}

async fn active_bookings(
    State(mock): State<MockBookingApi>,
    Path(username): Path<String>,
) -> Json<Value> {
    Json(json!({ "bookings": bookings_for(&mock, &username, true) }))
}

async fn booking_history(
    State(mock): State<MockBookingApi>,
    Path(username): Path<String>,
) -> Json<Value> {
    Json(json!({ "bookings": bookings_for(&mock, &username, false) }))
}

#[derive(Deserialize)]
struct CancelBody {
    booking_id: String,
    username: String,
}

async fn cancel_booking(
    State(mock): State<MockBookingApi>,
    Json(body): Json<CancelBody>,
) -> Response {
    mock.inner.counts.cancel.fetch_add(1, Ordering::SeqCst);
    let mut store = mock.inner.store.lock().expect("lock");
    let found = store
        .bookings
        .iter_mut()
        .find(|b| b["id"] == body.booking_id.as_str() && b["username"] == body.username.as_str());
    match found {
        Some(booking) => {
            booking["status"] = json!("cancelled");
            Json(json!({ "success": true, "message": "Booking cancelled" })).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Booking not found"),
    }
}

#[derive(Deserialize)]
struct WishlistBody {
    username: String,
    hotel_id: HotelId,
}

async fn wishlist(State(mock): State<MockBookingApi>, Path(username): Path<String>) -> Json<Value> {
    let ids = mock.wishlist_of(&username);
    let hotels: Vec<_> = ids.iter().filter_map(|id| mock.find_hotel(id.as_str())).collect();
    Json(json!({ "wishlist": hotels, "hotel_ids": ids }))
}

async fn wishlist_add(
    State(mock): State<MockBookingApi>,
    Json(body): Json<WishlistBody>,
) -> Response {
    mock.inner.counts.wishlist_add.fetch_add(1, Ordering::SeqCst);
    let mut store = mock.inner.store.lock().expect("lock");
    let saved = store.wishlists.entry(body.username).or_default();
    if saved.contains(&body.hotel_id) {
        return detail(StatusCode::BAD_REQUEST, "Already in wishlist");
    }
    saved.push(body.hotel_id);
    Json(json!({ "success": true, "message": "Added to wishlist" })).into_response()
}

async fn wishlist_remove(
    State(mock): State<MockBookingApi>,
    Json(body): Json<WishlistBody>,
) -> Json<Value> {
    mock.inner
        .counts
        .wishlist_remove
        .fetch_add(1, Ordering::SeqCst);
    let mut store = mock.inner.store.lock().expect("lock");
    if let Some(saved) = store.wishlists.get_mut(&body.username) {
        saved.retain(|id| id != &body.hotel_id);
    }
    Json(json!({ "success": true, "message": "Removed from wishlist" }))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(mock): State<MockBookingApi>, Json(body): Json<LoginBody>) -> Response {
    let store = mock.inner.store.lock().expect("lock");
    match store.accounts.get(&body.username) {
        Some(account) if account.password == body.password => {
            Json(json!({ "success": true, "user": account.user })).into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

#[derive(Deserialize)]
struct SignupBody {
    username: String,
    password: String,
    name: String,
}

async fn signup(State(mock): State<MockBookingApi>, Json(body): Json<SignupBody>) -> Response {
    let mut store = mock.inner.store.lock().expect("lock");
    if store.accounts.contains_key(&body.username) {
        return detail(StatusCode::BAD_REQUEST, "Username already exists");
    }
    let user = CurrentUser {
        username: Username::new(body.username.clone()),
        name: body.name,
        email: String::new(),
        phone: String::new(),
    };
    store.accounts.insert(
        body.username,
        Account {
            password: body.password,
            user: user.clone(),
        },
    );
    Json(json!({ "success": true, "user": user })).into_response()
}

#[derive(Deserialize)]
struct ProfileBody {
    name: String,
    email: String,
    phone: String,
}

async fn update_profile(
    State(mock): State<MockBookingApi>,
    Path(username): Path<String>,
    Json(body): Json<ProfileBody>,
) -> Response {
    let mut store = mock.inner.store.lock().expect("lock");
    let Some(account) = store.accounts.get_mut(&username) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    account.user.name = body.name;
    account.user.email = body.email;
    account.user.phone = body.phone;
    Json(json!({ "success": true, "user": account.user })).into_response()
}

#[derive(Deserialize)]
struct PasswordBody {
    username: String,
    current_password: String,
    new_password: String,
}

async fn update_password(
    State(mock): State<MockBookingApi>,
    Json(body): Json<PasswordBody>,
) -> Response {
    let mut store = mock.inner.store.lock().expect("lock");
    match store.accounts.get_mut(&body.username) {
        Some(account) if account.password == body.current_password => {
            account.password = body.new_password;
            Json(json!({ "success": true, "message": "Password updated" })).into_response()
        }
        Some(_) => detail(StatusCode::BAD_REQUEST, "Current password is incorrect"),
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn dashboard_stats(
    State(mock): State<MockBookingApi>,
    Path(username): Path<String>,
) -> Json<Value> {
    let all = bookings_for(&mock, &username, false);
    let active = all.iter().filter(|b| b["status"] == "confirmed").count();
    let spent: f64 = all
        .iter()
        .filter(|b| b["status"] == "confirmed")
        .filter_map(|b| b["total_price"].as_str()?.parse::<f64>().ok())
        .sum();
    Json(json!({
        "active_bookings": active,
        "total_bookings": all.len(),
        "total_spent": spent,
        "wishlist_count": mock.wishlist_of(&username).len(),
    }))
}

// =============================================================================
// Servers
// =============================================================================

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server error");
    });
    addr
}

/// A running mock booking API plus the web app pointed at it.
pub struct TestContext {
    pub mock: MockBookingApi,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestContext {
    /// Start both servers with the sample hotels.
    pub async fn start() -> Self {
        Self::with_hotels(sample_hotels()).await
    }

    /// Start both servers with the given hotels.
    pub async fn with_hotels(hotels: Vec<Listing>) -> Self {
        let mock = MockBookingApi::new(hotels);
        let api_addr = serve(mock.router()).await;

        let api_url = format!("http://{api_addr}");
        let config = WebConfig::from_lookup(|key| match key {
            "STAYBOOK_API_URL" => Some(api_url.clone()),
            _ => None,
        })
        .expect("Failed to build test configuration");

        let web_addr = serve(staybook_web::build_router(AppState::new(config))).await;

        Self {
            mock,
            base_url: format!("http://{web_addr}"),
            client: new_client(),
        }
    }

    /// Absolute URL of a web app path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sign the context's client in as [`TEST_USERNAME`].
    pub async fn login(&self) {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .form(&[("username", TEST_USERNAME), ("password", TEST_PASSWORD)])
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
    }

    /// Open the booking page for `hotel_id` and return the draft ID it
    /// issued.
    pub async fn open_booking(&self, hotel_id: &str) -> String {
        let body = self
            .client
            .get(self.url(&format!("/hotels/{hotel_id}/book")))
            .send()
            .await
            .expect("Failed to open booking page")
            .text()
            .await
            .expect("Failed to read booking page");
        draft_id_of(&body).expect("Booking page has no draft_id")
    }
}

/// Client that keeps cookies and does not follow redirects.
#[must_use]
pub fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Extract the hidden `draft_id` value from a booking page.
#[must_use]
pub fn draft_id_of(html: &str) -> Option<String> {
    let marker = r#"name="draft_id" value=""#;
    let start = html.find(marker)? + marker.len();
    let rest = html.get(start..)?;
    let end = rest.find('"')?;
    rest.get(..end).map(str::to_string)
}

/// Booking form fields with valid card details.
#[must_use]
pub fn booking_form<'a>(
    draft_id: &'a str,
    room_id: &'a str,
    check_in: &'a str,
    check_out: &'a str,
    guests: &'a str,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("draft_id", draft_id),
        ("room_id", room_id),
        ("check_in", check_in),
        ("check_out", check_out),
        ("guests", guests),
        ("card_number", "4111111111111111"),
        ("card_expiration", "12/30"),
        ("card_holder", "Alice Example"),
        ("card_cvc", "123"),
        ("card_password", "12"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_id_of() {
        let html = r#"<input type="hidden" name="draft_id" value="abc-123">"#;
        assert_eq!(draft_id_of(html).as_deref(), Some("abc-123"));
        assert_eq!(draft_id_of("<p>nothing</p>"), None);
    }
}
