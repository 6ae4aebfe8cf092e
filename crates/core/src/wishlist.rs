//! Saved-hotel membership set.
//!
//! The set is updated optimistically: [`Wishlist::toggle`] changes local
//! membership first and tells the caller which remote request to send. A
//! failed request is only logged by the caller, so local and remote state can
//! drift apart until the next full load.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::HotelId;

/// What a toggle did to local membership, and therefore which request to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    /// The hotel was added; send an add request.
    Added,
    /// The hotel was removed; send a remove request.
    Removed,
}

/// Hotels saved by the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    hotel_ids: BTreeSet<HotelId>,
}

impl Wishlist {
    /// Build from the IDs returned by the booking API. Duplicates collapse.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = HotelId>) -> Self {
        Self {
            hotel_ids: ids.into_iter().collect(),
        }
    }

    /// Whether the hotel is saved.
    #[must_use]
    pub fn contains(&self, id: &HotelId) -> bool {
        self.hotel_ids.contains(id)
    }

    /// Flip membership of `id`: present becomes absent, absent becomes present.
    pub fn toggle(&mut self, id: &HotelId) -> WishlistChange {
        if self.hotel_ids.remove(id) {
            WishlistChange::Removed
        } else {
            self.hotel_ids.insert(id.clone());
            WishlistChange::Added
        }
    }

    /// Remove `id` if present. Returns whether it was saved.
    pub fn remove(&mut self, id: &HotelId) -> bool {
        self.hotel_ids.remove(id)
    }

    /// Number of saved hotels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hotel_ids.len()
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotel_ids.is_empty()
    }

    /// Saved IDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &HotelId> {
        self.hotel_ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut wishlist = Wishlist::default();
        let id = HotelId::new("134");

        assert_eq!(wishlist.toggle(&id), WishlistChange::Added);
        assert!(wishlist.contains(&id));

        assert_eq!(wishlist.toggle(&id), WishlistChange::Removed);
        assert!(!wishlist.contains(&id));
    }

    #[test]
    fn test_double_toggle_restores_original_set() {
        let original = Wishlist::from_ids(["134", "188", "700"].map(HotelId::new));
        for id in ["134", "999"].map(HotelId::new) {
            let mut wishlist = original.clone();
            wishlist.toggle(&id);
            wishlist.toggle(&id);
            assert_eq!(wishlist, original);
        }
    }

    #[test]
    fn test_membership_is_never_duplicated() {
        let wishlist = Wishlist::from_ids(["134", "134", "135"].map(HotelId::new));
        assert_eq!(wishlist.len(), 2);
    }

    #[test]
    fn test_remove_reports_membership() {
        let mut wishlist = Wishlist::from_ids([HotelId::new("134")]);
        assert!(wishlist.remove(&HotelId::new("134")));
        assert!(!wishlist.remove(&HotelId::new("134")));
        assert!(wishlist.is_empty());
    }
}
