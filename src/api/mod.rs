//! HTTP API for the bias diagnostics service
//!
//! One router module per resource, all sharing `AppState` and the uniform
//! `{error: {code, message, details?}}` envelope from [`error`].

pub mod baselines;
pub mod error;
pub mod evaluations;
pub mod heuristics;
pub mod recommendations;
pub mod server;

pub use error::{ApiError, ApiJson, ApiQuery};
pub use server::ApiServer;

use crate::config::Settings;
use crate::error::BiascopeError;
use crate::storage::StorageBackend;
use std::sync::Arc;

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageBackend>, settings: Settings) -> Self {
        Self {
            storage,
            settings: Arc::new(settings),
        }
    }

    /// Map a domain error to the HTTP envelope
    ///
    /// Internal details of unexpected errors are only exposed when the debug
    /// setting is enabled.
    pub fn api_error(&self, err: BiascopeError) -> ApiError {
        ApiError::from_domain(err, self.settings.debug)
    }
}
