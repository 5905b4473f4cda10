//! Error types for the ankona library.
//!
//! Every failure that can reach an HTTP caller is an [`AnkonaError`]. The
//! variants map one-to-one onto a status code (see `server.rs`), so a
//! handler never has to decide how to report a failure: it returns the
//! error and the response is derived from the variant.
//!
//! Some failures are deliberately *not* errors. A failed refinement call or
//! an unreadable style-reference file degrade the translation pipeline to a
//! fallback value instead; those paths log a warning and never construct an
//! `AnkonaError` that escapes [`crate::convert`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ankona library.
#[derive(Debug, Error)]
pub enum AnkonaError {
    // ── Request validation ────────────────────────────────────────────────
    /// The uploaded case file is not a PDF.
    #[error("Only PDF files are supported.")]
    InvalidAttachment { content_type: Option<String> },

    /// A required form field is missing or the body could not be decoded.
    #[error("Invalid form data: {detail}")]
    InvalidForm { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No model client was configured (missing API key).
    #[error("{provider} API client is not initialized. {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API call failed (transport error, non-2xx status, blocked
    /// prompt). Never retried.
    #[error("AI processing failed: {message}")]
    LlmApiError { message: String },

    /// A schema-mode response was not valid JSON of the requested shape.
    #[error("Model response does not match the {schema} schema: {detail}")]
    SchemaMismatch { schema: &'static str, detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// docx-rs failed to serialise the generated document.
    #[error("Failed to render DOCX: {detail}")]
    DocumentRenderFailed { detail: String },

    /// Could not persist the translated document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The static landing page is not on disk.
    #[error("Landing page not found: '{path}'")]
    LandingPageMissing { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnkonaError {
    /// The error raised by every model call when no client is configured.
    pub fn not_configured() -> Self {
        AnkonaError::ProviderNotConfigured {
            provider: "Gemini".into(),
            hint: "Please ensure GEMINI_API_KEY environment variable is set.".into(),
        }
    }
}
