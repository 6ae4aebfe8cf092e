//! Process-wide services shared by handlers.
//!
//! # Services
//!
//! - `submissions` - Guard against concurrent submission of the same booking draft

pub mod submissions;

pub use submissions::{SubmissionGuard, SubmissionTicket};
