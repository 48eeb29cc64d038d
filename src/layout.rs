//! Typesetting – turns flow items into positioned text boxes and measures
//! their heights at a given width.

use crate::capture::{ImageContent, LayoutBox, TextContent, TextLine, TextRun};
use crate::fonts::{wrap_spans, wrap_text, FontManager, WrappedLine};
use crate::markup::{Block, Span};
use crate::style::{TextAlign, TextStyle, Theme};

/// Gap between the title and the side photo in the pinned header.
pub const HEADER_GAP: f32 = 20.0;
/// Space below the title row.
pub const TITLE_ROW_MARGIN: f32 = 16.0;
/// Space below each metadata line.
pub const META_MARGIN: f32 = 10.0;
/// Width reserved for right-aligned page numbers in the table of contents.
const TOC_NUMBER_COLUMN: f32 = 40.0;

/// Centered heading roles used on title and chapter pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerRole {
    BookTitle,
    BookSubtitle,
    Chapter,
}

/// Anything that can be placed in a page's flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowItem {
    Block(Block),
    /// Chapter sub-heading inside the table of contents.
    TocChapter(String),
    TocEntry {
        number: usize,
        title: String,
        page: usize,
    },
    Banner {
        text: String,
        role: BannerRole,
    },
    /// Short accent rule under a chapter banner.
    Rule,
}

/// Title, metadata lines and optional photo fixed to a document's first page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PinnedHeader {
    pub title: String,
    pub meta: Vec<String>,
    pub image: Option<String>,
}

/// Capability to measure how tall an item renders at a given width.
pub trait LayoutMeasurer {
    fn measure(&self, item: &FlowItem, width: f32) -> f32;
}

/// Boxes for one item, relative to the item's top-left corner.
#[derive(Debug, Clone)]
pub struct Typeset {
    pub height: f32,
    pub boxes: Vec<LayoutBox>,
}

impl Typeset {
    fn empty(height: f32) -> Self {
        Self {
            height,
            boxes: Vec::new(),
        }
    }
}

/// Font-metrics based typesetter; the default [`LayoutMeasurer`].
#[derive(Clone, Copy)]
pub struct Typesetter<'a> {
    fonts: &'a FontManager,
    theme: &'a Theme,
}

impl LayoutMeasurer for Typesetter<'_> {
    fn measure(&self, item: &FlowItem, width: f32) -> f32 {
        self.typeset(item, width).height
    }
}

impl<'a> Typesetter<'a> {
    pub fn new(fonts: &'a FontManager, theme: &'a Theme) -> Self {
        Self { fonts, theme }
    }

    pub fn fonts(&self) -> &'a FontManager {
        self.fonts
    }

    pub fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub fn typeset(&self, item: &FlowItem, width: f32) -> Typeset {
        let theme = self.theme;
        match item {
            FlowItem::Block(Block::Heading { level, text }) => {
                self.text(&[Span::plain(text.as_str())], theme.heading(*level), width, None)
            }
            FlowItem::Block(Block::Paragraph(spans)) => self.text(spans, theme.body, width, None),
            FlowItem::Block(Block::ListItem { marker, spans }) => {
                self.text(spans, theme.list_item, width, Some(marker.label()))
            }
            FlowItem::Block(Block::LineBreak) => Typeset::empty(theme.body.font_size * 0.5),
            FlowItem::TocChapter(label) => {
                self.text(&[Span::plain(label.as_str())], theme.toc_chapter, width, None)
            }
            FlowItem::TocEntry {
                number,
                title,
                page,
            } => self.toc_entry(*number, title, *page, width),
            FlowItem::Banner { text, role } => {
                let style = match role {
                    BannerRole::BookTitle => theme.book_title,
                    BannerRole::BookSubtitle => theme.book_subtitle,
                    BannerRole::Chapter => theme.chapter,
                };
                self.text(&[Span::plain(text.as_str())], style, width, None)
            }
            FlowItem::Rule => {
                let rule_width = width * 0.3;
                let mut rule = LayoutBox::new((width - rule_width) / 2.0, 0.0, rule_width, 3.0);
                rule.background_color = Some(theme.accent.rgba());
                Typeset {
                    height: 3.0,
                    boxes: vec![rule],
                }
            }
        }
    }

    /// Typeset the document title at `width`.
    pub fn title(&self, title: &str, width: f32) -> Typeset {
        self.text(&[Span::plain(title)], self.theme.title, width, None)
    }

    /// Typeset one metadata line.
    pub fn meta(&self, line: &str, width: f32) -> Typeset {
        self.text(&[Span::plain(line)], self.theme.meta, width, None)
    }

    /// On-page size of the header photo. Intrinsic dimensions set the aspect
    /// ratio; an image that failed to load keeps a 4:3 placeholder.
    pub fn side_image_size(&self, intrinsic: Option<(u32, u32)>, width: f32) -> (f32, f32) {
        let w = self.theme.side_image_width.min(width / 2.0);
        let h = match intrinsic {
            Some((pw, ph)) if pw > 0 && ph > 0 => w * ph as f32 / pw as f32,
            _ => w * 0.75,
        };
        (w, h)
    }

    /// Width left for the title beside an optional photo.
    pub fn title_width(&self, header: &PinnedHeader, width: f32, image_width: f32) -> f32 {
        if header.image.is_some() {
            (width - image_width - HEADER_GAP).max(1.0)
        } else {
            width
        }
    }

    /// Height the pinned header adds to the first page, margins included.
    pub fn header_height(
        &self,
        header: &PinnedHeader,
        width: f32,
        intrinsic: Option<(u32, u32)>,
    ) -> f32 {
        let (img_w, img_h) = match header.image {
            Some(_) => self.side_image_size(intrinsic, width),
            None => (0.0, 0.0),
        };
        let title_w = self.title_width(header, width, img_w);
        let row = self.title(&header.title, title_w).height.max(img_h);
        let meta: f32 = header
            .meta
            .iter()
            .map(|line| self.meta(line, width).height + META_MARGIN)
            .sum();
        row + TITLE_ROW_MARGIN + meta
    }

    /// The photo box for the header.
    pub fn image_box(&self, src: &str, size: (f32, f32)) -> LayoutBox {
        let mut b = LayoutBox::new(0.0, 0.0, size.0, size.1);
        b.image = Some(ImageContent {
            src: src.to_string(),
            width: size.0,
            height: size.1,
        });
        b
    }

    fn text(
        &self,
        spans: &[Span],
        style: TextStyle,
        width: f32,
        marker: Option<String>,
    ) -> Typeset {
        let avail = (width - style.indent).max(1.0);
        let lines = wrap_spans(spans, style.font_size, style.bold, avail, self.fonts);
        self.text_from_lines(lines, style, width, marker)
    }

    fn text_from_lines(
        &self,
        lines: Vec<WrappedLine>,
        style: TextStyle,
        width: f32,
        marker: Option<String>,
    ) -> Typeset {
        let avail = (width - style.indent).max(1.0);
        let line_height = self.fonts.line_height_px(style.font_size, style.line_height);
        let height = lines.len() as f32 * line_height;
        let text_lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let shift = match style.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => ((avail - line.width) / 2.0).max(0.0),
                };
                TextLine {
                    runs: line
                        .runs
                        .into_iter()
                        .map(|run| TextRun {
                            x_offset: run.x_offset + shift,
                            ..run
                        })
                        .collect(),
                    y_offset: i as f32 * line_height,
                }
            })
            .collect();

        let mut lb = LayoutBox::new(style.indent, 0.0, avail, height);
        lb.text = Some(TextContent {
            lines: text_lines,
            font_size: style.font_size,
            color: style.color.rgba(),
            line_height,
            list_marker: marker,
        });
        Typeset {
            height,
            boxes: vec![lb],
        }
    }

    fn toc_entry(&self, number: usize, title: &str, page: usize, width: f32) -> Typeset {
        let style = self.theme.toc_entry;
        let avail = (width - style.indent).max(1.0);
        let label = format!("{number}. {title}");
        let mut lines = wrap_text(
            &label,
            style.font_size,
            style.bold,
            (avail - TOC_NUMBER_COLUMN).max(1.0),
            self.fonts,
        );
        let page_text = page.to_string();
        let page_width = self
            .fonts
            .measure_text_width(&page_text, style.font_size, style.bold);
        if let Some(first) = lines.first_mut() {
            first.runs.push(TextRun {
                text: page_text,
                bold: style.bold,
                x_offset: (avail - page_width).max(0.0),
            });
        }
        self.text_from_lines(lines, style, width, None)
    }
}
