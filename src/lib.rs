//! # ankona
//!
//! Backend for the Ankona khata assistant and its legal case-file
//! translator, powered by Google Gemini.
//!
//! Two kinds of work sit behind one HTTP service:
//!
//! - **Direct-entry assistants.** A short text goes in, a schema-typed
//!   record comes out: a parsed khata (credit ledger) entry, a customer
//!   picked from a candidate list, or an information-desk answer. The record
//!   type is sent to Gemini as the response schema, so the reply either
//!   parses into it or the request fails.
//! - **Case-file translation.** A scanned Bangla legal PDF is translated to
//!   English Markdown, refined (optionally against the structure of a local
//!   `style_reference.docx`), and rendered as a Word document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Validate   declared media type must be application/pdf
//!  ├─ 2. Translate  Gemini, PDF inline → Markdown draft
//!  ├─ 3. Sample     style_reference.docx → constrained Markdown (optional)
//!  ├─ 4. Refine     Gemini, draft (+ sample) → final Markdown, or the draft
//!  └─ 5. Render     Markdown → DOCX, saved as <name>_Translated.docx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ankona::server::{serve, AppState};
//! use ankona::ServiceConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY / GOOGLE_API_KEY
//!     let state = AppState::new(ServiceConfig::from_env());
//!     serve("127.0.0.1:8000".parse()?, state).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ankona` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assistant;
pub mod config;
pub mod convert;
pub mod error;
pub mod gemini;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod records;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use convert::convert_case_file;
pub use error::AnkonaError;
pub use gemini::GeminiClient;
pub use model::{resolve_model, Attachment, GenerativeModel, ModelRequest};
pub use output::{ConversionStats, TranslatedDocument};
pub use pipeline::input::CaseFileUpload;
pub use progress::{ConversionProgressCallback, ConversionStage, NoopProgressCallback, ProgressCallback};
pub use records::{BookkeepingEntry, CustomerSelection, EntryType, InfoDeskReply, ResponseSchema};
