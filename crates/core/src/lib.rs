//! Staybook Core - Shared domain library.
//!
//! This crate provides the domain types and pure computations used by the
//! Staybook components:
//! - `web` - Server-rendered hotel booking UI
//! - `integration-tests` - End-to-end tests against a mock booking API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no sessions. Everything here can be unit tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and statuses
//! - [`catalog`] - Hotel listings and filter/sort criteria
//! - [`pricing`] - Night count and total price for a date range
//! - [`booking`] - Booking drafts, requests, and records
//! - [`wishlist`] - Saved-hotel membership set
//! - [`session`] - Signed-in user identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod catalog;
pub mod pricing;
pub mod session;
pub mod types;
pub mod wishlist;

pub use types::*;
