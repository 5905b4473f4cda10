//! Pipeline stages for case-file translation.
//!
//! Each submodule implements exactly one transformation step. The
//! orchestration (ordering, fallbacks, persistence) lives in
//! [`crate::convert`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ llm::translate ──▶ llm::refine ──▶ markup ──▶ render
//! (PDF)     (draft)              ▲ (final)       (blocks)   (DOCX)
//!                                │
//!                    extract (style_reference.docx)
//! ```
//!
//! 1. [`input`]: validate the upload and derive the output filename
//! 2. [`llm`]: the translate and refine model calls
//! 3. [`postprocess`]: strip wrapper artefacts from every model reply
//! 4. [`extract`]: read a reference DOCX back into constrained Markdown
//! 5. [`markup`]: the constrained Markdown dialect itself
//! 6. [`render`]: constrained Markdown → DOCX bytes

pub mod extract;
pub mod input;
pub mod llm;
pub mod markup;
pub mod postprocess;
pub mod render;
