//! Per-application callback state: configuration and the registered-outputs
//! set.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::dependency::Dependency;

/// Application-level flags consumed by the validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Skip id/property existence checks against the layout. Needed when
    /// callbacks target components generated after startup.
    #[serde(default)]
    pub suppress_callback_exceptions: bool,
}

/// The process-wide record of outputs already claimed by callbacks.
///
/// Append-only for the lifetime of the application; there is no removal
/// API. The set is read on every registration for duplicate detection and
/// appended by the dispatcher once a registration passes validation, so the
/// lock makes concurrent registrations observe a consistent view.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    config: AppConfig,
    registered_outputs: Mutex<Vec<Dependency>>,
}

impl CallbackRegistry {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registered_outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Record outputs as claimed. Called by the dispatcher after
    /// [`crate::validate_callback`] succeeds, never by the validator itself.
    pub fn register_outputs(&self, outputs: impl IntoIterator<Item = Dependency>) {
        self.registered_outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outputs);
    }

    /// Snapshot of every output registered so far.
    pub fn registered_outputs(&self) -> Vec<Dependency> {
        self.registered_outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
