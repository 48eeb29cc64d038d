//! PDF compositor – places page captures on fixed physical pages and produces
//! PDF bytes using `printpdf` (v0.8 ops-based API).
//!
//! Every capture becomes exactly one PDF page. The capture's logical width
//! is scaled to the page's content width; its height follows from the same
//! factor, so a capture keeps its aspect ratio.

use std::collections::HashMap;

use printpdf::*;

use crate::capture::{LayoutBox, PageCapture};
use crate::config::PageGeometry;
use crate::error::{ExportError, Result};
use crate::fonts::FontManager;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Minimum distance of a list marker from its item's text, in px.
const LIST_MARKER_OFFSET_PX: f32 = 16.0;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Fonts text is written with: the builtin Helvetica pair or embedded faces.
#[derive(Clone)]
enum PdfFonts {
    Builtin,
    Embedded { regular: FontId, bold: FontId },
}

/// Emits text runs and counts characters the builtin fonts cannot show.
struct TextWriter {
    fonts: PdfFonts,
    replaced: usize,
}

/// Maps one capture's pixel space onto a physical page.
struct Placement {
    /// PDF units per logical px.
    k: f32,
    left: f32,
    top: f32,
}

impl Placement {
    fn x(&self, px: f32) -> f32 {
        self.left + px * self.k
    }

    /// PDF origin is bottom-left; captures are top-left.
    fn y(&self, px: f32) -> f32 {
        self.top - px * self.k
    }
}

/// Compose captures into a PDF document.
pub fn compose_pdf(
    captures: &[PageCapture],
    geometry: &PageGeometry,
    title: &str,
    fonts: &FontManager,
) -> Result<Vec<u8>> {
    let page_w = Mm(geometry.width_mm);
    let page_h = Mm(geometry.height_mm);
    let margin = geometry.margin_mm * PT_PER_MM;
    let content_width = geometry.content_width_mm() * PT_PER_MM;
    let top = geometry.height_mm * PT_PER_MM - margin;

    let mut doc = PdfDocument::new(title);
    let mut writer = TextWriter {
        fonts: register_fonts(&mut doc, fonts)?,
        replaced: 0,
    };
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    let mut pages = Vec::with_capacity(captures.len());
    for (index, capture) in captures.iter().enumerate() {
        if capture.width_px == 0 {
            return Err(ExportError::Render(format!(
                "page {} was captured with zero width",
                index + 1
            )));
        }
        let mut resources: HashMap<&str, ImageResource> = HashMap::new();
        for (src, raster) in &capture.images {
            match RawImage::decode_from_bytes(&raster.png, &mut warnings) {
                Ok(raw) => {
                    resources.insert(
                        src.as_str(),
                        ImageResource {
                            xobj_id: doc.add_image(&raw),
                            px_width: raster.px_width,
                            px_height: raster.px_height,
                        },
                    );
                }
                Err(e) => log::warn!("Skipping image on page {} — PDF encode error: {e}", index + 1),
            }
        }

        let placement = Placement {
            k: capture.units_per_px(content_width),
            left: margin,
            top,
        };
        log::debug!(
            "page {}: capture {}×{} px → {:.1} pt tall",
            index + 1,
            capture.width_px,
            capture.height_px,
            capture.physical_height(content_width)
        );

        let mut ops = Vec::new();
        for lbox in &capture.boxes {
            render_box(&mut ops, lbox, &placement, &resources, &mut writer, fonts);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    if writer.replaced > 0 {
        log::warn!(
            "{} character(s) in '{title}' have no glyph in the builtin Helvetica font and \
             print as '?'; configure a TTF font (--font) that covers them",
            writer.replaced
        );
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    for w in &warnings {
        log::debug!("pdf: {w:?}");
    }
    Ok(bytes)
}

fn register_fonts(doc: &mut PdfDocument, fonts: &FontManager) -> Result<PdfFonts> {
    if !fonts.has_real_fonts() {
        return Ok(PdfFonts::Builtin);
    }
    let mut warnings = Vec::new();
    let mut embed = |bold: bool| -> Result<FontId> {
        let parsed = ParsedFont::from_bytes(&fonts.face(bold).bytes, 0, &mut warnings)
            .ok_or_else(|| ExportError::Font("font could not be embedded".to_string()))?;
        Ok(doc.add_font(&parsed))
    };
    let regular = embed(false)?;
    let bold = embed(true)?;
    Ok(PdfFonts::Embedded { regular, bold })
}

/// Text for a builtin font, plus the number of characters replaced by `?`.
///
/// printpdf writes builtin-font strings byte for byte under WinAnsiEncoding.
/// Only ASCII bytes are the same glyph in UTF-8 and WinAnsi, so everything
/// else is folded to an ASCII look-alike or replaced.
fn to_winlatin(s: &str) -> (String, usize) {
    let mut out = String::with_capacity(s.len());
    let mut replaced = 0;
    for c in s.chars() {
        match c {
            c if c.is_ascii() => out.push(c),
            '\u{00A0}' => out.push(' '),
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{00AB}' | '\u{00BB}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2026}' => out.push_str("..."),
            _ => {
                out.push('?');
                replaced += 1;
            }
        }
    }
    (out, replaced)
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn corner(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

impl TextWriter {
    /// Emit one run of text with its baseline at `(x, y)`.
    fn write(&mut self, ops: &mut Vec<Op>, text: &str, bold: bool, size: f32, x: f32, y: f32) {
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        });
        match &self.fonts {
            PdfFonts::Builtin => {
                let font = if bold {
                    BuiltinFont::HelveticaBold
                } else {
                    BuiltinFont::Helvetica
                };
                let (text, replaced) = to_winlatin(text);
                self.replaced += replaced;
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(size),
                    font,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(text)],
                    font,
                });
            }
            PdfFonts::Embedded { regular, bold: bold_id } => {
                let font = if bold { bold_id.clone() } else { regular.clone() };
                ops.push(Op::SetFontSize {
                    size: Pt(size),
                    font: font.clone(),
                });
                ops.push(Op::WriteText {
                    items: vec![TextItem::Text(text.to_string())],
                    font,
                });
            }
        }
        ops.push(Op::EndTextSection);
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    at: &Placement,
    images: &HashMap<&str, ImageResource>,
    writer: &mut TextWriter,
    fonts: &FontManager,
) {
    let x1 = at.x(lbox.x);
    let x2 = at.x(lbox.x + lbox.width);
    let y_top = at.y(lbox.y);
    let y_bottom = at.y(lbox.y + lbox.height);

    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![
                        corner(x1, y_bottom),
                        corner(x2, y_bottom),
                        corner(x2, y_top),
                        corner(x1, y_top),
                    ],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let size = text.font_size * at.k;
        let half_leading = (text.line_height - text.font_size).max(0.0) / 2.0;
        ops.push(Op::SetFillColor { col: rgb(&text.color) });

        for (i, line) in text.lines.iter().enumerate() {
            for run in &line.runs {
                if run.text.is_empty() {
                    continue;
                }
                let baseline =
                    line.y_offset + half_leading + fonts.ascender_px(text.font_size, run.bold);
                writer.write(
                    ops,
                    &run.text,
                    run.bold,
                    size,
                    at.x(lbox.x + run.x_offset),
                    at.y(lbox.y + baseline),
                );
            }

            if i == 0 {
                if let Some(marker) = &text.list_marker {
                    let baseline = line.y_offset + half_leading + fonts.ascender_px(text.font_size, false);
                    // Wide numbers ("12. ") end where the item text begins.
                    let offset = fonts
                        .measure_text_width(marker, text.font_size, false)
                        .max(LIST_MARKER_OFFSET_PX);
                    writer.write(
                        ops,
                        marker,
                        false,
                        size,
                        at.x(lbox.x - offset),
                        at.y(lbox.y + baseline),
                    );
                }
            }
        }
    }

    // Image – embed from the capture's oversampled raster. Broken images
    // have no raster and leave their box empty.
    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(img.src.as_str()) {
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width * at.k / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height * at.k / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(x1)),
                    translate_y: Some(Pt(at.y(lbox.y + img.height))),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, at, images, writer, fonts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{TextContent, TextLine, TextRun};
    use std::collections::BTreeMap;

    fn text_capture() -> PageCapture {
        let mut b = LayoutBox::new(20.0, 20.0, 754.0, 25.6);
        b.text = Some(TextContent {
            lines: vec![TextLine {
                runs: vec![TextRun {
                    text: "Hello".into(),
                    bold: true,
                    x_offset: 0.0,
                }],
                y_offset: 0.0,
            }],
            font_size: 16.0,
            color: [0.2, 0.2, 0.2, 1.0],
            line_height: 25.6,
            list_marker: Some("\u{2022} ".into()),
        });
        PageCapture {
            width_px: 1588,
            height_px: 200,
            scale: 2,
            boxes: vec![b],
            images: BTreeMap::new(),
        }
    }

    #[test]
    fn render_empty_document() {
        let bytes = compose_pdf(&[], &PageGeometry::a4(), "empty", &FontManager::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_text_page() {
        let captures = vec![text_capture(), text_capture()];
        let bytes = compose_pdf(&captures, &PageGeometry::a5(), "two", &FontManager::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn zero_width_capture_is_rejected() {
        let mut capture = text_capture();
        capture.width_px = 0;
        let err = compose_pdf(&[capture], &PageGeometry::a4(), "bad", &FontManager::default()).unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));
    }

    #[test]
    fn winlatin_folds_punctuation_and_counts_cyrillic() {
        assert_eq!(to_winlatin("\u{2022} a\u{2013}b\u{2026}"), ("* a-b...".to_string(), 0));
        assert_eq!(to_winlatin("аb"), ("?b".to_string(), 1));
        let (text, replaced) = to_winlatin("Всички рецепти");
        assert!(text.is_ascii());
        assert_eq!(replaced, 13);
    }

    #[test]
    fn builtin_writer_counts_missing_glyphs() {
        let mut writer = TextWriter {
            fonts: PdfFonts::Builtin,
            replaced: 0,
        };
        let mut ops = Vec::new();
        writer.write(&mut ops, "Салата", false, 12.0, 0.0, 0.0);
        writer.write(&mut ops, "Salad", true, 12.0, 0.0, 0.0);
        assert_eq!(writer.replaced, 6);
        assert_eq!(ops.len(), 10);
    }

    #[test]
    fn placement_flips_the_y_axis() {
        let at = Placement {
            k: 0.5,
            left: 10.0,
            top: 800.0,
        };
        assert!((at.x(100.0) - 60.0).abs() < f32::EPSILON);
        assert!((at.y(100.0) - 750.0).abs() < f32::EPSILON);
    }
}
