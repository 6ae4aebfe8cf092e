//! In-flight guard for booking submissions.
//!
//! A draft lives in the browser session, but two requests from the same
//! browser each load their own copy of it. The guard is the shared record of
//! which drafts are being submitted right now, so a double click sends one
//! booking request and the second click gets a conflict.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

/// Set of draft IDs with a booking request in flight.
#[derive(Clone, Default)]
pub struct SubmissionGuard {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl SubmissionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `draft_id` for submission.
    ///
    /// Returns `None` if the draft is already being submitted. The claim is
    /// released when the returned ticket is dropped.
    #[must_use]
    pub fn try_begin(&self, draft_id: Uuid) -> Option<SubmissionTicket> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(draft_id);

        inserted.then(|| SubmissionTicket {
            guard: self.clone(),
            draft_id,
        })
    }

    /// Whether `draft_id` is being submitted.
    #[must_use]
    pub fn is_in_flight(&self, draft_id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&draft_id)
    }
}

/// Claim on one draft's submission. Releases on drop.
#[must_use = "the claim is released as soon as the ticket is dropped"]
pub struct SubmissionTicket {
    guard: SubmissionGuard,
    draft_id: Uuid,
}

impl SubmissionTicket {
    #[must_use]
    pub const fn draft_id(&self) -> Uuid {
        self.draft_id
    }
}

impl Drop for SubmissionTicket {
    fn drop(&mut self) {
        self.guard
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.draft_id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_refused_until_release() {
        let guard = SubmissionGuard::new();
        let draft = Uuid::new_v4();

        let ticket = guard.try_begin(draft).unwrap();
        assert!(guard.is_in_flight(draft));
        assert!(guard.try_begin(draft).is_none());

        drop(ticket);
        assert!(!guard.is_in_flight(draft));
        assert!(guard.try_begin(draft).is_some());
    }

    #[test]
    fn test_drafts_are_independent() {
        let guard = SubmissionGuard::new();
        let _a = guard.try_begin(Uuid::new_v4()).unwrap();
        assert!(guard.try_begin(Uuid::new_v4()).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_claims_admit_exactly_one() {
        let guard = SubmissionGuard::new();
        let draft = Uuid::new_v4();
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let guard = guard.clone();
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                if let Some(ticket) = guard.try_begin(draft) {
                    tx.send(ticket.draft_id()).await.unwrap();
                    // Hold the claim until every task has tried.
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
            }));
        }
        drop(tx);
        for task in tasks {
            task.await.unwrap();
        }

        let mut admitted = 0;
        while rx.recv().await.is_some() {
            admitted += 1;
        }
        assert_eq!(admitted, 1);
    }
}
