//! Post-processing: deterministic cleanup of model-generated Markdown.
//!
//! Runs on every free-text model result before it is used, so the draft
//! handed to refinement and the text handed to the DOCX renderer are both
//! free of wrapper artefacts:
//!
//! - an outer ` ```markdown ... ``` ` fence around the whole reply
//! - Windows-style `\r\n` line endings
//! - invisible Unicode (zero-width spaces, BOM, soft hyphens)
//!
//! Content is never rewritten. A fence that does not wrap the entire reply
//! is left alone and ends up as plain paragraph text.
//!
//! ## Rule Order
//!
//! Invisible characters go first so a leading BOM cannot hide the fence.
//! Line endings come next so the fence pattern only has to match `\n`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw model reply.
///
/// 1. Strip invisible Unicode
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Strip an outer Markdown fence
/// 4. Trim surrounding whitespace
pub fn clean_model_markdown(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = normalise_line_endings(&s);
    let s = strip_markdown_fences(&s);
    s.trim().to_string()
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\n(.*?)\n?```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
