//! Status enums for listings and bookings.

use serde::{Deserialize, Serialize};

/// Whether a listing can currently be booked.
///
/// The booking API encodes this as the strings `"yes"` and `"no"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Yes,
    No,
}

impl Availability {
    /// Whether the listing is bookable.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available { Self::Yes } else { Self::No }
    }
}

/// Lifecycle status of a booking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Wire/CSS name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid booking status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_wire_values() {
        assert_eq!(serde_json::to_string(&Availability::Yes).unwrap(), "\"yes\"");
        let no: Availability = serde_json::from_str("\"no\"").unwrap();
        assert!(!no.is_available());
    }

    #[test]
    fn test_booking_status_round_trips_through_str() {
        for status in [BookingStatus::Confirmed, BookingStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("pending".parse::<BookingStatus>().is_err());
    }
}
