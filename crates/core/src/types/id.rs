//! Newtype IDs for type-safe entity references.
//!
//! The booking API hands out opaque string identifiers (hotel row IDs such as
//! `"134"`, short booking IDs such as `"3f2a9c1e"`). Use the `define_id!`
//! macro to wrap them so a hotel ID can never be passed where a booking ID is
//! expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `Display`, `AsRef<str>`, and `From<&str>`/`From<String>`
///
/// # Example
///
/// ```rust
/// # use staybook_core::define_id;
/// define_id!(RoomId);
/// define_id!(InvoiceId);
///
/// let room = RoomId::new("134");
/// let invoice = InvoiceId::new("134");
///
/// // These are different types, so this won't compile:
/// // let _: RoomId = invoice;
/// assert_eq!(room.as_str(), invoice.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// Identifiers issued by the booking API
define_id!(HotelId);
define_id!(BookingId);
define_id!(Username);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_as_str() {
        let id = HotelId::new("134");
        assert_eq!(id.as_str(), "134");
        assert_eq!(id.to_string(), "134");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = BookingId::from("3f2a9c1e");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"3f2a9c1e\"");

        let parsed: BookingId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_ids_order_lexically() {
        let mut ids = vec![HotelId::new("190"), HotelId::new("134"), HotelId::new("188")];
        ids.sort();
        assert_eq!(
            ids.iter().map(HotelId::as_str).collect::<Vec<_>>(),
            ["134", "188", "190"]
        );
    }
}
