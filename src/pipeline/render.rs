//! Rendering: constrained Markdown blocks → DOCX bytes.
//!
//! Headings map to the built-in `Heading1`..`Heading3` paragraph styles,
//! bullets to `ListBullet` with a single-level bullet numbering, and plain
//! paragraphs carry no style so Word shows them as `Normal`. Style ids and
//! display names follow Word's built-ins, which is what lets
//! [`crate::pipeline::extract`] read a rendered document back.

use crate::error::AnkonaError;
use crate::pipeline::markup::{parse_markup, Block};
use docx_rs::*;
use std::io::Cursor;
use tracing::debug;

/// Media type of the rendered document.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Numbering id shared by every bullet paragraph.
const BULLET_NUMBERING_ID: usize = 1;

/// Style id of bullet paragraphs.
pub const LIST_BULLET_STYLE: &str = "ListBullet";

/// Style id for a heading level.
pub fn heading_style_id(level: u8) -> &'static str {
    match level {
        1 => "Heading1",
        2 => "Heading2",
        _ => "Heading3",
    }
}

fn heading_style(level: u8, size: usize) -> Style {
    Style::new(heading_style_id(level), StyleType::Paragraph)
        .name(&format!("Heading {level}"))
        .size(size)
        .bold()
}

/// Register the heading and list styles plus the bullet numbering.
fn with_styles(docx: Docx) -> Docx {
    let list_bullet =
        Style::new(LIST_BULLET_STYLE, StyleType::Paragraph).name("List Bullet");

    let bullet_level = Level::new(
        0,
        Start::new(1),
        NumberFormat::new("bullet"),
        LevelText::new("•"),
        LevelJc::new("left"),
    )
    .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None);

    docx.add_style(heading_style(1, 32))
        .add_style(heading_style(2, 28))
        .add_style(heading_style(3, 26))
        .add_style(list_bullet)
        .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING_ID).add_level(bullet_level))
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID))
}

fn block_paragraph(block: &Block) -> Paragraph {
    let run = Run::new().add_text(block.text());
    match block {
        Block::Heading { level, .. } => Paragraph::new()
            .add_run(run)
            .style(heading_style_id(*level)),
        Block::BulletItem { .. } => Paragraph::new()
            .add_run(run)
            .style(LIST_BULLET_STYLE)
            .numbering(NumberingId::new(BULLET_NUMBERING_ID), IndentLevel::new(0)),
        Block::Paragraph { .. } => Paragraph::new().add_run(run),
    }
}

/// Build an in-memory document from blocks, in order.
pub fn build_document(blocks: &[Block]) -> Docx {
    blocks
        .iter()
        .fold(with_styles(Docx::new()), |docx, block| {
            docx.add_paragraph(block_paragraph(block))
        })
}

/// Serialise blocks to DOCX bytes.
pub fn render_blocks(blocks: &[Block]) -> Result<Vec<u8>, AnkonaError> {
    let mut buffer = Vec::new();
    build_document(blocks)
        .build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| AnkonaError::DocumentRenderFailed {
            detail: e.to_string(),
        })?;
    debug!("Rendered {} blocks → {} bytes DOCX", blocks.len(), buffer.len());
    Ok(buffer)
}

/// Convert constrained Markdown straight to DOCX bytes.
pub fn markup_to_docx(markup: &str) -> Result<Vec<u8>, AnkonaError> {
    render_blocks(&parse_markup(markup))
}
