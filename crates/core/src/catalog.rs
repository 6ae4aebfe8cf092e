//! Hotel catalog: listing entries and the filter/sort criteria used to query
//! them.
//!
//! The web layer turns the search form into a [`FilterCriteria`], sends it to
//! the booking API as query parameters, and keeps the answer in a
//! [`CatalogState`]. The matching rules the API applies are mirrored in
//! [`FilterCriteria::matches`] and [`FilterCriteria::apply`] so the contract
//! can be tested without a server.

use std::cmp::Reverse;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Availability, HotelId, Money};

/// Message shown when the listing request fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load hotels";

/// A hotel room listing as returned by the booking API.
///
/// Every room type of a hotel is its own listing; listings of the same hotel
/// share `name` and `city`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: HotelId,
    pub name: String,
    pub city: String,
    pub room_type: String,
    #[serde(rename = "price_per_night")]
    pub nightly_price: Money,
    pub capacity: u32,
    pub available: Availability,
    pub rating: Decimal,
}

impl Listing {
    /// Whether this listing can be booked right now.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available.is_available()
    }

    /// Guest capacity, never less than one.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity.max(1)
    }
}

/// Sort order for the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// API order.
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "price_low")]
    PriceAsc,
    #[serde(rename = "price_high")]
    PriceDesc,
    /// Highest rated first.
    #[serde(rename = "rating")]
    Rating,
}

impl SortKey {
    /// Value of the `sort_by` query parameter, `None` for API order.
    #[must_use]
    pub const fn as_param(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::PriceAsc => Some("price_low"),
            Self::PriceDesc => Some("price_high"),
            Self::Rating => Some("rating"),
        }
    }

    /// Parse a `sort_by` value. Unknown and blank values mean API order.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        match value.trim() {
            "price_low" => Self::PriceAsc,
            "price_high" => Self::PriceDesc,
            "rating" => Self::Rating,
            _ => Self::None,
        }
    }
}

/// Errors from parsing the search form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A price bound is not a number.
    #[error("{field} must be a number")]
    InvalidPrice {
        /// Form field name.
        field: &'static str,
    },
    /// A price bound is below zero.
    #[error("{field} cannot be negative")]
    NegativePrice {
        /// Form field name.
        field: &'static str,
    },
}

/// Raw search form fields, exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub available_only: Option<String>,
    pub sort_by: Option<String>,
}

/// Validated catalog filter criteria. `Default` is the unfiltered query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub available_only: bool,
    pub sort: SortKey,
}

impl FilterCriteria {
    /// Build criteria from submitted form fields. Blank fields are absent.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if a price bound is not a non-negative number.
    pub fn from_params(params: &FilterParams) -> Result<Self, FilterError> {
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Ok(Self {
            search,
            min_price: parse_price(params.min_price.as_deref(), "min_price")?,
            max_price: parse_price(params.max_price.as_deref(), "max_price")?,
            available_only: params
                .available_only
                .as_deref()
                .is_some_and(|v| matches!(v.trim(), "on" | "true" | "1" | "yes")),
            sort: params
                .sort_by
                .as_deref()
                .map_or(SortKey::None, SortKey::from_param),
        })
    }

    /// Whether no filter or sort is set.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }

    /// Query parameters for the listing request. Only populated fields are
    /// emitted, so the unfiltered query has no parameters at all.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.amount().normalize().to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.amount().normalize().to_string()));
        }
        if self.available_only {
            pairs.push(("available_only", "true".to_owned()));
        }
        if let Some(sort) = self.sort.as_param() {
            pairs.push(("sort_by", sort.to_owned()));
        }
        pairs
    }

    /// Whether a listing satisfies every predicate.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !listing.name.to_lowercase().contains(&needle)
                && !listing.city.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| listing.nightly_price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.nightly_price > max) {
            return false;
        }
        !self.available_only || listing.is_available()
    }

    /// Filter and sort listings the way the booking API does.
    #[must_use]
    pub fn apply(&self, listings: &[Listing]) -> Vec<Listing> {
        let mut result: Vec<Listing> = listings
            .iter()
            .filter(|listing| self.matches(listing))
            .cloned()
            .collect();

        match self.sort {
            SortKey::None => {}
            SortKey::PriceAsc => result.sort_by_key(|l| l.nightly_price),
            SortKey::PriceDesc => result.sort_by_key(|l| Reverse(l.nightly_price)),
            SortKey::Rating => result.sort_by_key(|l| Reverse(l.rating)),
        }

        result
    }
}

fn parse_price(raw: Option<&str>, field: &'static str) -> Result<Option<Money>, FilterError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let amount: Decimal = raw
        .parse()
        .map_err(|_| FilterError::InvalidPrice { field })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(FilterError::NegativePrice { field });
    }

    Ok(Some(Money::new(amount)))
}

/// Result of the most recent listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    /// Listings from the last successful query, replacing any earlier result.
    Loaded(Vec<Listing>),
    /// The request failed; nothing is shown.
    Failed(String),
}

impl CatalogState {
    /// The generic failure state.
    #[must_use]
    pub fn failed() -> Self {
        Self::Failed(LOAD_FAILED_MESSAGE.to_owned())
    }

    /// Listings to display (empty after a failure).
    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        match self {
            Self::Loaded(listings) => listings,
            Self::Failed(_) => &[],
        }
    }

    /// Error text to display, if the last query failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Loaded(_) => None,
            Self::Failed(message) => Some(message),
        }
    }
}

impl<E> From<Result<Vec<Listing>, E>> for CatalogState {
    fn from(result: Result<Vec<Listing>, E>) -> Self {
        result.map_or_else(|_| Self::failed(), Self::Loaded)
    }
}
