//! Extraction: DOCX → constrained Markdown, for the refinement style sample.
//!
//! Only body-level paragraphs are read. Tables, section properties and
//! everything else contribute nothing. Each paragraph's style label decides
//! its marker. The label is the style's display name (`w:name`) when the
//! document's style table has one, else the raw style id, so documents with
//! localized or custom ids (`berschrift2` named "Heading 2") still classify:
//!
//! | Style label                      | Emitted line   |
//! |----------------------------------|----------------|
//! | `Heading N` / `HeadingN`         | `'#'×N text`   |
//! | `List …` containing `Number`/`num` | `1. text`    |
//! | any other `List …`               | `* text`       |
//! | anything else                    | `text`         |
//!
//! The numbered form is emitted even though [`crate::pipeline::markup`]
//! does not parse it back: the output only ever feeds a prompt.

use docx_rs::{read_docx, DocumentChild, Docx, ParagraphChild, RunChild};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A body paragraph reduced to its style label and plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledParagraph {
    /// Paragraph style id (`w:pStyle`), `None` for the default style.
    pub style: Option<String>,
    /// Display name of that style from the style table, if declared.
    pub style_name: Option<String>,
    pub text: String,
}

/// What a style label means for the Markdown marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Heading(u8),
    BulletList,
    NumberedList,
    Normal,
}

impl StyleKind {
    /// Classify a style id or display name.
    pub fn classify(label: &str) -> StyleKind {
        let label = label.trim();
        let lower = label.to_ascii_lowercase();

        if let Some(rest) = lower.strip_prefix("heading") {
            return match rest.trim().parse::<u8>() {
                Ok(level) if level >= 1 => StyleKind::Heading(level),
                _ => StyleKind::Normal,
            };
        }

        if label.starts_with("List") {
            if label.contains("Number") || lower.contains("num") {
                return StyleKind::NumberedList;
            }
            return StyleKind::BulletList;
        }

        StyleKind::Normal
    }
}

impl StyledParagraph {
    /// The label used for classification: display name first, then id.
    pub fn label(&self) -> Option<&str> {
        self.style_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.style.as_deref())
    }

    /// The Markdown line for this paragraph, or `None` if its text is blank.
    pub fn to_markup(&self) -> Option<String> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        let kind = self
            .label()
            .map(StyleKind::classify)
            .unwrap_or(StyleKind::Normal);
        Some(match kind {
            StyleKind::Heading(level) => format!("{} {}", "#".repeat(level as usize), text),
            StyleKind::BulletList => format!("* {text}"),
            StyleKind::NumberedList => format!("1. {text}"),
            StyleKind::Normal => text.to_string(),
        })
    }
}

/// Body paragraphs of a parsed document, in order.
pub fn styled_paragraphs(docx: &Docx) -> Vec<StyledParagraph> {
    let names = style_names(docx);
    docx.document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => {
                let style = p.property.style.as_ref().map(|s| s.val.clone());
                let style_name = style.as_ref().and_then(|id| names.get(id).cloned());
                Some(StyledParagraph {
                    style,
                    style_name,
                    text: paragraph_text(&p.children),
                })
            }
            _ => None,
        })
        .collect()
}

/// Style id → display name for every named style in the style table.
fn style_names(docx: &Docx) -> HashMap<String, String> {
    docx.styles
        .styles
        .iter()
        .filter_map(|style| {
            // docx-rs keeps the name private; its serialized form is the plain string.
            let name = serde_json::to_value(&style.name).ok()?;
            let name = name.as_str()?.trim();
            (!name.is_empty()).then(|| (style.style_id.clone(), name.to_string()))
        })
        .collect()
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => text.push_str(&paragraph_text(&link.children)),
            _ => {}
        }
    }
    text
}

/// Join the Markdown lines of non-blank paragraphs with `\n`.
pub fn paragraphs_to_markup(paragraphs: &[StyledParagraph]) -> String {
    paragraphs
        .iter()
        .filter_map(StyledParagraph::to_markup)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract constrained Markdown from DOCX bytes.
///
/// Best-effort: a document that cannot be read yields an empty string.
pub fn extract_markup(bytes: &[u8]) -> String {
    match read_docx(bytes) {
        Ok(docx) => {
            let paragraphs = styled_paragraphs(&docx);
            let markup = paragraphs_to_markup(&paragraphs);
            debug!(
                "Extracted {} chars from {} paragraphs",
                markup.len(),
                paragraphs.len()
            );
            markup
        }
        Err(e) => {
            warn!("Could not read DOCX for structured text: {e}");
            String::new()
        }
    }
}
