//! The constrained Markdown dialect shared by the model and the DOCX stages.
//!
//! Only three block kinds exist: headings of level 1–3, bullet items and
//! plain paragraphs. There is no nesting, no inline formatting and no
//! fencing. Anything that is not recognised is a paragraph, verbatim.

/// One line-level unit of a constrained Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `#`, `##` or `###` heading. `level` is always 1, 2 or 3.
    Heading { level: u8, text: String },
    /// `* ` or `- ` item.
    BulletItem { text: String },
    /// Any other non-blank line.
    Paragraph { text: String },
}

impl Block {
    /// The block's text without its marker.
    pub fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } | Block::BulletItem { text } | Block::Paragraph { text } => {
                text
            }
        }
    }

    /// Render back to a single line of constrained Markdown.
    pub fn to_markup(&self) -> String {
        match self {
            Block::Heading { level, text } => {
                format!("{} {}", "#".repeat(*level as usize), text)
            }
            Block::BulletItem { text } => format!("* {text}"),
            Block::Paragraph { text } => text.clone(),
        }
    }
}

/// Line prefixes in match priority order. Longer heading markers come first
/// so `### ` is never read as `# ` followed by `## `.
const PREFIXES: [(&str, Kind); 5] = [
    ("### ", Kind::Heading(3)),
    ("## ", Kind::Heading(2)),
    ("# ", Kind::Heading(1)),
    ("* ", Kind::Bullet),
    ("- ", Kind::Bullet),
];

#[derive(Clone, Copy)]
enum Kind {
    Heading(u8),
    Bullet,
}

/// Parse constrained Markdown into blocks.
///
/// Lines are trimmed and blank lines dropped. Exactly the matched prefix is
/// stripped, so content that itself starts with `#` or `*` survives:
/// `"# #1 Priority"` is a level-1 heading with text `"#1 Priority"`.
pub fn parse_markup(input: &str) -> Vec<Block> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify_line)
        .collect()
}

fn classify_line(line: &str) -> Block {
    for (prefix, kind) in PREFIXES {
        if let Some(rest) = line.strip_prefix(prefix) {
            let text = rest.trim().to_string();
            return match kind {
                Kind::Heading(level) => Block::Heading { level, text },
                Kind::Bullet => Block::BulletItem { text },
            };
        }
    }
    Block::Paragraph {
        text: line.to_string(),
    }
}

/// Render blocks as constrained Markdown, one block per line.
pub fn to_markup(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::to_markup)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    fn bullet(text: &str) -> Block {
        Block::BulletItem { text: text.into() }
    }

    fn para(text: &str) -> Block {
        Block::Paragraph { text: text.into() }
    }

    #[test]
    fn blank_lines_produce_no_blocks() {
        assert_eq!(
            parse_markup("# Title\n\n\nBody"),
            vec![heading(1, "Title"), para("Body")]
        );
    }

    #[test]
    fn level_three_heading_trimmed() {
        assert_eq!(parse_markup("  ### Sub Heading  "), vec![heading(3, "Sub Heading")]);
    }

    #[test]
    fn heading_levels_by_priority() {
        assert_eq!(
            parse_markup("# One\n## Two\n### Three"),
            vec![heading(1, "One"), heading(2, "Two"), heading(3, "Three")]
        );
    }

    #[test]
    fn both_bullet_markers() {
        assert_eq!(
            parse_markup("* Item one\n- Item two"),
            vec![bullet("Item one"), bullet("Item two")]
        );
    }

    #[test]
    fn numbered_marker_is_plain_paragraph() {
        assert_eq!(parse_markup("1. Item"), vec![para("1. Item")]);
    }

    #[test]
    fn only_exact_prefix_is_stripped() {
        assert_eq!(parse_markup("# #hashtag"), vec![heading(1, "#hashtag")]);
        assert_eq!(parse_markup("* *starred*"), vec![bullet("*starred*")]);
        assert_eq!(parse_markup("- - dash"), vec![bullet("- dash")]);
        assert_eq!(parse_markup("## # odd"), vec![heading(2, "# odd")]);
    }

    #[test]
    fn markers_without_space_are_paragraphs() {
        assert_eq!(
            parse_markup("#NoSpace\n####  Deep\n**Bold**"),
            vec![para("#NoSpace"), para("####  Deep"), para("**Bold**")]
        );
    }

    #[test]
    fn code_fence_is_plain_text() {
        assert_eq!(
            parse_markup("```\nবাংলাদেশ\n"),
            vec![para("```"), para("বাংলাদেশ")]
        );
    }

    #[test]
    fn crlf_input() {
        assert_eq!(
            parse_markup("## Heading\r\nText\r\n"),
            vec![heading(2, "Heading"), para("Text")]
        );
    }

    #[test]
    fn markup_round_trip() {
        let src = "# Title\n## Section\n### Sub\n* item\nplain";
        assert_eq!(to_markup(&parse_markup(src)), src);
    }

    #[test]
    fn dash_bullet_renders_as_star() {
        assert_eq!(to_markup(&parse_markup("- x")), "* x");
    }
}
