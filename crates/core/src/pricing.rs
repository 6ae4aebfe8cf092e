//! Night count and total price for a stay.
//!
//! [`quote`] is a pure function of the nightly rate and the two dates. It is
//! called again every time one of them changes; nothing is cached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Nights and total price for a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quote {
    pub nights: u32,
    pub total: Money,
}

impl Quote {
    /// The quote for missing or non-increasing dates.
    pub const INVALID: Self = Self {
        nights: 0,
        total: Money::ZERO,
    };

    /// A quote is bookable only when it covers at least one night.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.nights > 0
    }
}

/// Number of nights between check-in and check-out.
///
/// Dates are whole calendar days, so the ceiling of the day difference is the
/// difference itself. Missing, equal, or inverted dates give zero.
#[must_use]
pub fn nights(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> u32 {
    let (Some(check_in), Some(check_out)) = (check_in, check_out) else {
        return 0;
    };

    let days = (check_out - check_in).num_days();
    u32::try_from(days).unwrap_or(0)
}

/// Quote a stay at `nightly_price` for the given dates. A total too large to
/// represent is treated like invalid dates.
#[must_use]
pub fn quote(nightly_price: Money, check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> Quote {
    let nights = nights(check_in, check_out);
    if nights == 0 {
        return Quote::INVALID;
    }

    nightly_price
        .checked_times(nights)
        .map_or(Quote::INVALID, |total| Quote { nights, total })
}

/// Keep the guest count inside a room's capacity.
///
/// A count that no longer fits (or is zero) resets to one rather than being
/// clamped down silently to the maximum.
#[must_use]
pub const fn clamp_guests(current: u32, capacity: u32) -> u32 {
    if current >= 1 && current <= capacity {
        current
    } else {
        1
    }
}

/// Choices for the guest selector: `1..=capacity`, at least one entry.
#[must_use]
pub fn guest_options(capacity: u32) -> Vec<u32> {
    (1..=capacity.max(1)).collect()
}
