//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::BookingApiClient;
use crate::config::WebConfig;
use crate::services::SubmissionGuard;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Per-user state lives in the
/// session, not here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    api: BookingApiClient,
    submissions: SubmissionGuard,
}

impl AppState {
    /// Create a new application state with a booking API client rooted at
    /// `config.api_url`.
    #[must_use]
    pub fn new(config: WebConfig) -> Self {
        let api = BookingApiClient::new(config.api_url.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                submissions: SubmissionGuard::new(),
            }),
        }
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the booking API client.
    #[must_use]
    pub fn api(&self) -> &BookingApiClient {
        &self.inner.api
    }

    /// Get a reference to the booking submission guard.
    #[must_use]
    pub fn submissions(&self) -> &SubmissionGuard {
        &self.inner.submissions
    }
}
