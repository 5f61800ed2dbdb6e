//! Observer trait for conversion state and per-page events.
//!
//! Inject an [`Arc<dyn ConversionObserver>`] via
//! [`crate::config::ConversionConfigBuilder::observer`] to follow a
//! conversion as it moves through its states.
//!
//! # Example
//!
//! ```rust
//! use edgequake_convert::{ConversionConfig, ConversionObserver, ConversionState};
//! use std::sync::{Arc, Mutex};
//!
//! struct Recorder(Mutex<Vec<ConversionState>>);
//!
//! impl ConversionObserver for Recorder {
//!     fn on_state_change(&self, state: ConversionState) {
//!         self.0.lock().unwrap().push(state);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .observer(Arc::new(Recorder(Mutex::new(Vec::new()))))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one `convert` call.
///
/// `Idle → Running → {Succeeded, Failed}`; both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl ConversionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionState::Succeeded | ConversionState::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: ConversionState) -> bool {
        matches!(
            (self, next),
            (ConversionState::Idle, ConversionState::Running)
                | (ConversionState::Running, ConversionState::Succeeded)
                | (ConversionState::Running, ConversionState::Failed)
        )
    }
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionState::Idle => "idle",
            ConversionState::Running => "running",
            ConversionState::Succeeded => "succeeded",
            ConversionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Called by the dispatcher and the page extractor.
///
/// Implementations must be `Send + Sync`: pipelines run on a blocking
/// worker thread. All methods default to no-ops.
pub trait ConversionObserver: Send + Sync {
    /// Called on every state transition, starting with `Running`.
    fn on_state_change(&self, state: ConversionState) {
        let _ = state;
    }

    /// Called after each PDF page has been rasterised and encoded.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: pages that will be rendered in this call
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }
}

/// A no-op observer for callers that don't need events.
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type Observer = Arc<dyn ConversionObserver>;
