//! Hotel catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use staybook_core::catalog::{CatalogState, FilterCriteria, FilterParams, Listing};
use staybook_core::session::CurrentUser;
use staybook_core::wishlist::Wishlist;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::wishlist::load_wishlist;
use crate::state::AppState;

/// A listing plus whether the signed-in user has saved it.
#[derive(Clone)]
pub struct HotelCard {
    pub listing: Listing,
    pub saved: bool,
}

impl HotelCard {
    /// Mark each listing against the user's wishlist.
    #[must_use]
    pub fn from_listings(listings: &[Listing], wishlist: &Wishlist) -> Vec<Self> {
        listings
            .iter()
            .map(|listing| Self {
                saved: wishlist.contains(&listing.id),
                listing: listing.clone(),
            })
            .collect()
    }
}

/// The search form as submitted, echoed back into the inputs.
#[derive(Clone, Default)]
pub struct FilterFormView {
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub available_only: bool,
    pub sort_by: String,
}

impl FilterFormView {
    fn from_params(params: &FilterParams, criteria: Option<&FilterCriteria>) -> Self {
        Self {
            search: params.search.clone().unwrap_or_default(),
            min_price: params.min_price.clone().unwrap_or_default(),
            max_price: params.max_price.clone().unwrap_or_default(),
            available_only: criteria.is_some_and(|c| c.available_only),
            sort_by: criteria
                .and_then(|c| c.sort.as_param())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "hotels/index.html")]
pub struct HotelsIndexTemplate {
    pub user: Option<CurrentUser>,
    pub form: FilterFormView,
    pub hotels: Vec<HotelCard>,
    pub error: Option<String>,
    pub filtered: bool,
    pub sort_options: Vec<SortOption>,
}

/// One entry of the sort dropdown.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn sort_options(current: &str) -> Vec<SortOption> {
    SORT_OPTIONS
        .iter()
        .map(|&(value, label)| SortOption {
            value,
            label,
            selected: value == current,
        })
        .collect()
}

const SORT_OPTIONS: [(&str, &str); 4] = [
    ("", "Recommended"),
    ("price_low", "Price: low to high"),
    ("price_high", "Price: high to low"),
    ("rating", "Top rated"),
];

/// Display the catalog, filtered by the query string.
///
/// A form error is shown inline and no request is sent. A failed request
/// shows an empty list with "Failed to load hotels".
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let (catalog, criteria) = match FilterCriteria::from_params(&params) {
        Ok(criteria) => {
            let catalog = match state.api().list_hotels(&criteria).await {
                Ok(listings) => CatalogState::Loaded(listings),
                Err(e) => {
                    tracing::warn!("Failed to load hotels: {e}");
                    CatalogState::failed()
                }
            };
            (catalog, Some(criteria))
        }
        Err(e) => (CatalogState::Failed(e.to_string()), None),
    };

    let wishlist = load_wishlist(&session).await;
    let form = FilterFormView::from_params(&params, criteria.as_ref());

    HotelsIndexTemplate {
        user,
        sort_options: sort_options(&form.sort_by),
        form,
        hotels: HotelCard::from_listings(catalog.listings(), &wishlist),
        error: catalog.error().map(str::to_string),
        filtered: criteria.as_ref().is_some_and(|c| !c.is_unfiltered()),
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use staybook_core::types::{Availability, HotelId, Money};

    use super::*;

    fn listing(id: &str) -> Listing {
        Listing {
            id: HotelId::new(id),
            name: format!("Hotel {id}"),
            city: "Lisbon".to_string(),
            room_type: "standard".to_string(),
            nightly_price: Money::from_cents(9_900),
            capacity: 2,
            available: Availability::Yes,
            rating: rust_decimal::Decimal::new(42, 1),
        }
    }

    #[test]
    fn test_cards_mark_saved_hotels() {
        let wishlist = Wishlist::from_ids([HotelId::new("2")]);
        let cards = HotelCard::from_listings(&[listing("1"), listing("2")], &wishlist);
        assert!(!cards[0].saved);
        assert!(cards[1].saved);
    }

    #[test]
    fn test_form_echoes_normalized_sort() {
        let params = FilterParams {
            sort_by: Some("bogus".to_string()),
            available_only: Some("on".to_string()),
            ..FilterParams::default()
        };
        let criteria = FilterCriteria::from_params(&params).ok();
        let form = FilterFormView::from_params(&params, criteria.as_ref());
        assert_eq!(form.sort_by, "");
        assert!(form.available_only);
    }

    #[test]
    fn test_sort_options_select_current() {
        let selected: Vec<_> = sort_options("rating")
            .into_iter()
            .filter(|o| o.selected)
            .map(|o| o.value)
            .collect();
        assert_eq!(selected, vec!["rating"]);
    }
}
