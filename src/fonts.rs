//! Font loading and text measurement using `ttf-parser`.
//!
//! Two faces are used, regular and bold. When real font files are supplied
//! their glyph advances drive line wrapping and the faces are embedded in the
//! PDF; otherwise Helvetica-like heuristic metrics are used together with the
//! builtin PDF fonts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capture::TextRun;
use crate::error::{ExportError, Result};
use crate::markup::Span;

/// Font files to load before an export starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSources {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for the synthetic builtin metrics.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

impl FontData {
    fn parse(bytes: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| ExportError::Font(format!("Failed to parse font: {e}")))?;
        Ok(Self {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        })
    }

    fn builtin() -> Self {
        Self {
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The regular + bold pair used by every export.
#[derive(Clone)]
pub struct FontManager {
    regular: FontData,
    bold: FontData,
}

impl Default for FontManager {
    fn default() -> Self {
        Self {
            regular: FontData::builtin(),
            bold: FontData::builtin(),
        }
    }
}

impl FontManager {
    /// Load the configured font files. A missing bold face reuses the regular
    /// one. Resolves once every face is parsed, so callers can treat the
    /// returned manager as "fonts ready".
    pub async fn load(sources: &FontSources) -> Result<Self> {
        let mut mgr = Self::default();
        if let Some(path) = &sources.regular {
            let bytes = tokio::fs::read(path).await?;
            mgr.regular = FontData::parse(bytes)?;
            mgr.bold = mgr.regular.clone();
            log::debug!("loaded regular font '{}'", path.display());
        }
        if let Some(path) = &sources.bold {
            let bytes = tokio::fs::read(path).await?;
            mgr.bold = FontData::parse(bytes)?;
            log::debug!("loaded bold font '{}'", path.display());
        }
        Ok(mgr)
    }

    /// Build from in-memory font bytes.
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self> {
        let regular = FontData::parse(regular)?;
        let bold = match bold {
            Some(bytes) => FontData::parse(bytes)?,
            None => regular.clone(),
        };
        Ok(Self { regular, bold })
    }

    pub fn face(&self, bold: bool) -> &FontData {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// True when real font files back the metrics (and get embedded).
    pub fn has_real_fonts(&self) -> bool {
        !self.regular.is_builtin()
    }

    /// Measure the width of a string at a given font size (in px).
    /// Without real font bytes an average character width of 0.5 × size
    /// (0.55 × for bold) is assumed.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let data = self.face(bold);

        if data.is_builtin() {
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        }

        if let Ok(face) = ttf_parser::Face::parse(&data.bytes, 0) {
            let scale = font_size / data.units_per_em;
            text.chars()
                .map(|ch| match face.glyph_index(ch) {
                    Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                    None => font_size * 0.5,
                })
                .sum()
        } else {
            text.chars().count() as f32 * font_size * 0.5
        }
    }

    /// Line height in px.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in px for the given weight.
    pub fn ascender_px(&self, font_size: f32, bold: bool) -> f32 {
        let data = self.face(bold);
        data.ascender * font_size / data.units_per_em
    }
}

/// A wrapped line: runs positioned from the line start, plus its width.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub runs: Vec<TextRun>,
    pub width: f32,
}

/// Pieces of one whitespace-delimited word; a word may change weight midway
/// (`**200**г`).
type Word = Vec<(String, bool)>;

fn split_words(spans: &[Span], force_bold: bool) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut current: Word = Vec::new();
    for span in spans {
        let bold = span.bold || force_bold;
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                continue;
            }
            match current.last_mut() {
                Some((text, b)) if *b == bold => text.push(ch),
                _ => current.push((ch.to_string(), bold)),
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Greedy word-wrap of bold/plain spans to `max_width` px. Adjacent pieces of
/// the same weight are merged into one run. Always returns at least one line.
pub fn wrap_spans(
    spans: &[Span],
    font_size: f32,
    force_bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<WrappedLine> {
    let words = split_words(spans, force_bold);
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut line = WrappedLine {
        runs: Vec::new(),
        width: 0.0,
    };

    for word in words {
        let word_width: f32 = word
            .iter()
            .map(|(t, b)| fonts.measure_text_width(t, font_size, *b))
            .sum();
        let lead_bold = word[0].1;
        let space = fonts.measure_text_width(" ", font_size, lead_bold);

        if !line.runs.is_empty() && max_width > 0.0 && line.width + space + word_width > max_width
        {
            lines.push(std::mem::replace(
                &mut line,
                WrappedLine {
                    runs: Vec::new(),
                    width: 0.0,
                },
            ));
        }

        let mut first = true;
        for (text, bold) in word {
            let prefix = if first && !line.runs.is_empty() { " " } else { "" };
            first = false;
            let piece = format!("{prefix}{text}");
            let piece_width = fonts.measure_text_width(&piece, font_size, bold);
            match line.runs.last_mut() {
                Some(run) if run.bold == bold => run.text.push_str(&piece),
                _ => line.runs.push(TextRun {
                    text: piece,
                    bold,
                    x_offset: line.width,
                }),
            }
            line.width += piece_width;
        }
    }

    if !line.runs.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Word-wrap a single plain or bold string.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<WrappedLine> {
    wrap_spans(&[Span::plain(text)], font_size, bold, max_width, fonts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        assert!(lines.iter().all(|l| l.width <= 60.0 || l.runs.len() == 1));
    }

    #[test]
    fn bold_runs_keep_their_weight_and_offsets() {
        let mgr = FontManager::default();
        let spans = [Span::plain("Some "), Span::bold("bold"), Span::plain(" text")];
        let lines = wrap_spans(&spans, 10.0, false, 1000.0, &mgr);
        assert_eq!(lines.len(), 1);
        let runs = &lines[0].runs;
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "Some");
        assert_eq!(runs[1].text, " bold");
        assert!(runs[1].bold);
        assert_eq!(runs[2].text, " text");
        assert!((runs[1].x_offset - 20.0).abs() < 0.01);
    }

    #[test]
    fn glued_pieces_stay_on_one_line() {
        let mgr = FontManager::default();
        let spans = [Span::bold("200"), Span::plain("г")];
        let lines = wrap_spans(&spans, 10.0, false, 5.0, &mgr);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].runs.len(), 2);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        let mgr = FontManager::default();
        let lines = wrap_text("", 12.0, false, 100.0, &mgr);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].runs.is_empty());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(FontManager::from_bytes(vec![0, 1, 2, 3], None).is_err());
    }
}
