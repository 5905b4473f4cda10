//! Output types returned by case-file conversion.

use crate::pipeline::render::DOCX_MEDIA_TYPE;
use std::fmt;
use std::path::PathBuf;

/// A translated case file, ready to be delivered.
#[derive(Clone)]
pub struct TranslatedDocument {
    /// `<basename>_Translated.docx`.
    pub filename: String,
    /// Serialised DOCX package.
    pub docx: Vec<u8>,
    /// The constrained Markdown the document was rendered from.
    pub markdown: String,
    /// `false` when refinement degraded and the draft was rendered.
    pub refined: bool,
    /// Whether a style sample was offered to the refinement call.
    pub style_sample_used: bool,
    /// Where the document was persisted, if persistence is on.
    pub saved_to: Option<PathBuf>,
    pub stats: ConversionStats,
}

impl TranslatedDocument {
    /// Media type of [`Self::docx`].
    pub fn media_type(&self) -> &'static str {
        DOCX_MEDIA_TYPE
    }
}

impl fmt::Debug for TranslatedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatedDocument")
            .field("filename", &self.filename)
            .field("docx_len", &self.docx.len())
            .field("markdown_len", &self.markdown.len())
            .field("refined", &self.refined)
            .field("style_sample_used", &self.style_sample_used)
            .field("saved_to", &self.saved_to)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Wall-clock timings for one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub translate_ms: u64,
    pub refine_ms: u64,
    pub render_ms: u64,
    pub total_ms: u64,
}
