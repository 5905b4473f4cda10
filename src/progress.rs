//! Progress-callback trait for case-file conversion stages.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ServiceConfigBuilder::progress_callback`] to receive an
//! event as each stage of [`crate::convert::convert_case_file`] starts,
//! finishes or degrades to its fallback. The CLI drives its spinner from
//! these; the HTTP service leaves the callback unset.
//!
//! # Example
//!
//! ```rust
//! use ankona::{ConversionProgressCallback, ConversionStage, ServiceConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: ConversionStage, elapsed_ms: u64) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} done in {elapsed_ms}ms", stage.label());
//!     }
//! }
//!
//! let config = ServiceConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { finished: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The stages of a case-file conversion, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionStage {
    Translate,
    StyleSample,
    Refine,
    Render,
    Persist,
}

impl ConversionStage {
    /// Human-readable label for logs and progress displays.
    pub fn label(self) -> &'static str {
        match self {
            ConversionStage::Translate => "Translating",
            ConversionStage::StyleSample => "Reading style reference",
            ConversionStage::Refine => "Refining",
            ConversionStage::Render => "Building DOCX",
            ConversionStage::Persist => "Saving",
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only
/// override what they care about. Stages run strictly one after another,
/// but one callback may be shared by concurrent conversions, hence
/// `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before a stage starts.
    fn on_stage_start(&self, stage: ConversionStage) {
        let _ = stage;
    }

    /// Called when a stage produced its normal result.
    fn on_stage_complete(&self, stage: ConversionStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fell back instead of producing its normal
    /// result (no style sample, refinement kept the draft).
    fn on_stage_degraded(&self, stage: ConversionStage, reason: &str) {
        let _ = (stage, reason);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ServiceConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
