//! Recipe markup → block structure.
//!
//! The dialect is line based:
//! - `# `, `## `, `### ` headings (rendered one level below the document title)
//! - `- ` / `* ` bullet items and `1. ` numbered items
//! - `**bold**` spans inside paragraphs and list items
//! - blank lines as explicit line breaks

use serde::{Deserialize, Serialize};

/// A run of text that is either bold or plain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Marker in front of a list item. Ordered items keep the number the author
/// wrote, so a list interrupted by blank lines still reads 1, 2, 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListMarker {
    Bullet,
    Number(String),
}

impl ListMarker {
    pub fn is_ordered(&self) -> bool {
        matches!(self, ListMarker::Number(_))
    }

    /// Marker as printed before the item text.
    pub fn label(&self) -> String {
        match self {
            ListMarker::Bullet => "\u{2022} ".to_string(),
            ListMarker::Number(n) => format!("{n}. "),
        }
    }
}

/// A structural unit of translated content. Every list item is its own
/// block, so a page break may fall between two items of one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// Level 2–4; level 1 belongs to the document title.
    Heading { level: u8, text: String },
    ListItem { marker: ListMarker, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    LineBreak,
}

/// Split on non-greedy `**…**` pairs. Plain runs (including empty ones)
/// alternate with bold runs, so concatenating the span texts with the markers
/// re-inserted gives back the input.
pub fn split_bold(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let inner = &rest[open + 2..];
        let Some(close) = inner.find("**") else {
            break;
        };
        spans.push(Span::plain(&rest[..open]));
        spans.push(Span::bold(&inner[..close]));
        rest = &inner[close + 2..];
    }
    spans.push(Span::plain(rest));
    spans
}

/// `^\d+\.\s+(.+)$` – returns the number and the item text.
fn ordered_item(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let after_dot = line[digits..].strip_prefix('.')?;
    let text = after_dot.trim_start();
    if text.len() == after_dot.len() || text.is_empty() {
        return None;
    }
    Some((&line[..digits], text))
}

/// Translate markup into blocks in a single forward scan.
pub fn translate(markup: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for raw in markup.split('\n') {
        let line = raw.trim();

        if line.is_empty() {
            blocks.push(Block::LineBreak);
            continue;
        }

        let heading = [("### ", 4), ("## ", 3), ("# ", 2)]
            .iter()
            .find_map(|(prefix, level)| line.strip_prefix(*prefix).map(|t| (*level, t)));
        if let Some((level, text)) = heading {
            blocks.push(Block::Heading {
                level,
                text: text.to_string(),
            });
            continue;
        }

        let item = if let Some(text) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            Some((ListMarker::Bullet, text))
        } else {
            ordered_item(line).map(|(n, text)| (ListMarker::Number(n.to_string()), text))
        };
        blocks.push(match item {
            Some((marker, text)) => Block::ListItem {
                marker,
                spans: split_bold(text),
            },
            None => Block::Paragraph(split_bold(line)),
        });
    }
    blocks
}

fn spans_to_markup(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| {
            if s.bold {
                format!("**{}**", s.text)
            } else {
                s.text.clone()
            }
        })
        .collect()
}

/// Serialise blocks back into markup. `translate(to_markup(b)) == b` for
/// blocks produced by [`translate`].
pub fn to_markup(blocks: &[Block]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let hashes = "#".repeat(usize::from(level.saturating_sub(1).max(1)));
                lines.push(format!("{hashes} {text}"));
            }
            Block::ListItem { marker, spans } => {
                let prefix = match marker {
                    ListMarker::Bullet => "-".to_string(),
                    ListMarker::Number(n) => format!("{n}."),
                };
                lines.push(format!("{prefix} {}", spans_to_markup(spans)));
            }
            Block::Paragraph(spans) => lines.push(spans_to_markup(spans)),
            Block::LineBreak => lines.push(String::new()),
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_break_and_bold_paragraph() {
        let blocks = translate("# Title\n\nSome **bold** text");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 2,
                    text: "Title".into()
                },
                Block::LineBreak,
                Block::Paragraph(vec![
                    Span::plain("Some "),
                    Span::bold("bold"),
                    Span::plain(" text"),
                ]),
            ]
        );
    }

    #[test]
    fn heading_prefixes_resolve_most_specific_first() {
        let blocks = translate("### a\n## b\n# c");
        let levels: Vec<u8> = blocks
            .iter()
            .map(|b| match b {
                Block::Heading { level, .. } => *level,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(levels, [4, 3, 2]);
    }

    #[test]
    fn heading_text_is_not_bold_processed() {
        let blocks = translate("## **Продукти**");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 3,
                text: "**Продукти**".into()
            }]
        );
    }

    fn markers(blocks: &[Block]) -> Vec<ListMarker> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { marker, .. } => Some(marker.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn each_list_item_is_its_own_block() {
        let blocks = translate("- a\n* b\n1. c\n2.  d\n- e");
        assert_eq!(blocks.len(), 5);
        assert_eq!(
            markers(&blocks),
            [
                ListMarker::Bullet,
                ListMarker::Bullet,
                ListMarker::Number("1".into()),
                ListMarker::Number("2".into()),
                ListMarker::Bullet,
            ]
        );
        assert_eq!(
            blocks[3],
            Block::ListItem {
                marker: ListMarker::Number("2".into()),
                spans: vec![Span::plain("d")],
            }
        );
    }

    #[test]
    fn ordered_items_keep_source_numbers_across_breaks() {
        let blocks = translate("1. Измийте\n\n2. Нарежете\n\n3. Сварете");
        let labels: Vec<String> = markers(&blocks).iter().map(ListMarker::label).collect();
        assert_eq!(labels, ["1. ", "2. ", "3. "]);
        assert_eq!(blocks[1], Block::LineBreak);
        assert_eq!(to_markup(&blocks), "1. Измийте\n\n2. Нарежете\n\n3. Сварете");
    }

    #[test]
    fn list_item_bold_applies_after_prefix() {
        let blocks = translate("- **200 г** брашно");
        assert_eq!(
            blocks,
            vec![Block::ListItem {
                marker: ListMarker::Bullet,
                spans: vec![
                    Span::plain(""),
                    Span::bold("200 г"),
                    Span::plain(" брашно"),
                ],
            }]
        );
    }

    #[test]
    fn paragraph_between_items_and_empty_line_breaks() {
        let blocks = translate("- a\nplain\n\n- b");
        assert!(matches!(blocks[0], Block::ListItem { .. }));
        assert!(matches!(blocks[1], Block::Paragraph(_)));
        assert_eq!(blocks[2], Block::LineBreak);
        assert!(matches!(blocks[3], Block::ListItem { .. }));
    }

    #[test]
    fn not_an_ordered_item() {
        assert_eq!(ordered_item("1.5 kg"), None);
        assert_eq!(ordered_item("12. x"), Some(("12", "x")));
        assert_eq!(ordered_item("a. x"), None);
    }

    #[test]
    fn unmatched_marker_stays_literal() {
        assert_eq!(
            split_bold("a ** b **c** d"),
            vec![Span::plain("a "), Span::bold(" b "), Span::plain("c** d")]
        );
        assert_eq!(split_bold("x ** y"), vec![Span::plain("x ** y")]);
    }

    #[test]
    fn structure_survives_reserialisation() {
        let input = "# Продукти\n- **2** яйца\n- мляко\n\n## Стъпки\n1. Разбий\n2. Изпечи **внимателно**\nГотово!\n### Бележки";
        let blocks = translate(input);
        assert_eq!(translate(&to_markup(&blocks)), blocks);
    }
}
