//! Client for the booking REST API.
//!
//! # Architecture
//!
//! - One method per remote operation, JSON in and out via `reqwest` 0.13
//! - The booking API is the source of truth; nothing is persisted locally
//! - Featured hotels are cached in memory via `moka` (60 second TTL)
//! - No method retries; callers decide how a failure is shown
//!
//! # Example
//!
//! ```rust,ignore
//! use staybook_web::api::BookingApiClient;
//!
//! let client = BookingApiClient::new(config.api_url.clone());
//! let hotels = client.list_hotels(&FilterCriteria::default()).await?;
//! ```

mod types;

pub use types::{BookingConfirmation, ProfileUpdate, WishlistContents};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use staybook_core::booking::{BookingRecord, BookingRequest, DashboardStats};
use staybook_core::catalog::{FilterCriteria, Listing};
use staybook_core::session::CurrentUser;
use staybook_core::{BookingId, HotelId, Username};

use types::{
    Ack, BookingsResponse, CancelBody, Credentials, ErrorBody, HotelsResponse, PasswordChangeBody,
    RoomsResponse, SignupBody, UserResponse, WishlistBody,
};

const FEATURED_KEY: &str = "featured";
const FEATURED_TTL: Duration = Duration::from_secs(60);

/// Errors that can occur when talking to the booking API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API could not be reached or the body could not be read.
    #[error("booking API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("booking API returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: StatusCode,
        /// The `detail` string of the error body, when there is one.
        detail: Option<String>,
    },

    /// The API answered 2xx with a body of the wrong shape.
    #[error("unexpected booking API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Text to show the user: the server-provided detail when present,
    /// otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Client for the booking API.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct BookingApiClient {
    inner: Arc<BookingApiClientInner>,
}

struct BookingApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    featured: Cache<&'static str, Vec<Listing>>,
}

impl BookingApiClient {
    /// Create a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let featured = Cache::builder()
            .max_capacity(1)
            .time_to_live(FEATURED_TTL)
            .build();

        Self {
            inner: Arc::new(BookingApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                featured,
            }),
        }
    }

    /// Base URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Hotels
    // =========================================================================

    /// Listings matching `criteria`, in the order the API returns them.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_hotels(&self, criteria: &FilterCriteria) -> Result<Vec<Listing>, ApiError> {
        let mut url = self.endpoint(&["hotels"]);
        let pairs = criteria.to_query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let response: HotelsResponse = self.send(self.request(Method::GET, url)).await?;
        tracing::debug!(count = response.hotels.len(), "Loaded hotels");
        Ok(response.hotels)
    }

    /// One listing per hotel for the landing page. Cached for 60 seconds.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails. Failures are not cached.
    #[instrument(skip(self))]
    pub async fn featured_hotels(&self) -> Result<Vec<Listing>, ApiError> {
        if let Some(hotels) = self.inner.featured.get(&FEATURED_KEY).await {
            tracing::debug!("Featured hotels served from cache");
            return Ok(hotels);
        }

        let url = self.endpoint(&["hotels", "featured"]);
        let response: HotelsResponse = self.send(self.request(Method::GET, url)).await?;
        self.inner
            .featured
            .insert(FEATURED_KEY, response.hotels.clone())
            .await;
        Ok(response.hotels)
    }

    /// A single listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with status 404 if the listing is unknown.
    #[instrument(skip(self), fields(hotel_id = %id))]
    pub async fn get_hotel(&self, id: &HotelId) -> Result<Listing, ApiError> {
        let url = self.endpoint(&["hotels", id.as_str()]);
        self.send(self.request(Method::GET, url)).await
    }

    /// Every room type offered by the hotel called `hotel_name`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get_rooms(&self, hotel_name: &str) -> Result<Vec<Listing>, ApiError> {
        let url = self.endpoint(&["hotels", "rooms", hotel_name]);
        let response: RoomsResponse = self.send(self.request(Method::GET, url)).await?;
        Ok(response.rooms)
    }

    // =========================================================================
    // Bookings
    // =========================================================================

    /// Submit a booking. Sent exactly once; never retried.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the API's detail (for example
    /// "Invalid card details") when the booking is refused.
    #[instrument(skip(self, request), fields(hotel_id = %request.hotel_id, username = %request.username))]
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingConfirmation, ApiError> {
        let url = self.endpoint(&["book"]);
        let confirmation: BookingConfirmation = self
            .send(self.request(Method::POST, url).json(request))
            .await?;
        tracing::info!(booking_id = %confirmation.booking.id, "Booking confirmed");
        Ok(confirmation)
    }

    /// Active (confirmed) bookings of `username`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_bookings(&self, username: &Username) -> Result<Vec<BookingRecord>, ApiError> {
        let url = self.endpoint(&["bookings", username.as_str()]);
        let response: BookingsResponse = self.send(self.request(Method::GET, url)).await?;
        Ok(response.bookings)
    }

    /// Every booking of `username`, cancelled ones included.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn booking_history(
        &self,
        username: &Username,
    ) -> Result<Vec<BookingRecord>, ApiError> {
        let url = self.endpoint(&["bookings", "history", username.as_str()]);
        let response: BookingsResponse = self.send(self.request(Method::GET, url)).await?;
        Ok(response.bookings)
    }

    /// Cancel one booking.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with status 404 if the booking does not
    /// belong to `username`.
    #[instrument(skip(self))]
    pub async fn cancel_booking(
        &self,
        booking_id: &BookingId,
        username: &Username,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["bookings", "cancel"]);
        let body = CancelBody {
            booking_id,
            username,
        };
        let ack: Ack = self.send(self.request(Method::POST, url).json(&body)).await?;
        tracing::info!(message = %ack.message, "Booking cancelled");
        Ok(())
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Saved hotels of `username`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn wishlist(&self, username: &Username) -> Result<WishlistContents, ApiError> {
        let url = self.endpoint(&["wishlist", username.as_str()]);
        self.send(self.request(Method::GET, url)).await
    }

    /// Save a hotel.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` ("Already in wishlist") if already saved.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(
        &self,
        username: &Username,
        hotel_id: &HotelId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["wishlist", "add"]);
        let body = WishlistBody { username, hotel_id };
        let _: Ack = self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(())
    }

    /// Unsave a hotel. Removing an unsaved hotel succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(
        &self,
        username: &Username,
        hotel_id: &HotelId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["wishlist", "remove"]);
        let body = WishlistBody { username, hotel_id };
        let _: Ack = self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(())
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Check credentials and return the user record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with status 401 for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, ApiError> {
        let url = self.endpoint(&["auth", "login"]);
        let body = Credentials {
            username,
            password: password.expose_secret(),
        };
        let response: UserResponse = self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(response.user)
    }

    /// Create an account and return the new user record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` ("Username already exists") on conflict.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        username: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<CurrentUser, ApiError> {
        let url = self.endpoint(&["auth", "signup"]);
        let body = SignupBody {
            username,
            password: password.expose_secret(),
            name,
        };
        let response: UserResponse = self.send(self.request(Method::POST, url).json(&body)).await?;
        Ok(response.user)
    }

    /// Replace the editable profile fields and return the updated record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        username: &Username,
        update: &ProfileUpdate,
    ) -> Result<CurrentUser, ApiError> {
        let url = self.endpoint(&["profile", username.as_str()]);
        let response: UserResponse = self.send(self.request(Method::PUT, url).json(update)).await?;
        Ok(response.user)
    }

    /// Change the password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` ("Current password is incorrect") when the
    /// current password does not match.
    #[instrument(skip(self, current, new))]
    pub async fn update_password(
        &self,
        username: &Username,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["profile", "password", "update"]);
        let body = PasswordChangeBody {
            username,
            current_password: current.expose_secret(),
            new_password: new.expose_secret(),
        };
        let _: Ack = self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    /// Booking and wishlist counts for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self, username: &Username) -> Result<DashboardStats, ApiError> {
        let url = self.endpoint(&["dashboard", "stats", username.as_str()]);
        self.send(self.request(Method::GET, url)).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Send a request and decode a 2xx JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message);
            tracing::debug!(
                status = %status,
                detail = detail.as_deref().unwrap_or(""),
                "Booking API returned non-success status"
            );
            return Err(ApiError::Rejected { status, detail });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse booking API response"
            );
            ApiError::Decode(e)
        })
    }
}
