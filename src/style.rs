//! Typography for exported documents: one [`Theme`] per export mode.
//!
//! Sizes are logical pixels at the mode's logical page width; the compositor
//! scales everything to physical units.

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Parse `#rrggbb` or `#rgb`; anything else yields black.
    pub fn hex(hex: &str) -> Self {
        Self::from_hex(hex).unwrap_or(Self::BLACK)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: 1.0,
            }),
            3 => Some(Self {
                r: channel(&hex[0..1].repeat(2))?,
                g: channel(&hex[1..2].repeat(2))?,
                b: channel(&hex[2..3].repeat(2))?,
                a: 1.0,
            }),
            _ => None,
        }
    }

    pub fn rgba(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Resolved style of one kind of text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub bold: bool,
    pub color: Color,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub align: TextAlign,
    /// Left indent in px.
    pub indent: f32,
}

impl TextStyle {
    const fn new(font_size: f32, bold: bool, color: Color, line_height: f32) -> Self {
        Self {
            font_size,
            bold,
            color,
            line_height,
            align: TextAlign::Left,
            indent: 0.0,
        }
    }

    fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }

    fn indented(mut self, indent: f32) -> Self {
        self.indent = indent;
        self
    }
}

/// Every text style plus the few geometric constants a page layout needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub title: TextStyle,
    pub meta: TextStyle,
    /// Index 0 → level 2, 1 → level 3, 2 → level 4.
    pub headings: [TextStyle; 3],
    pub body: TextStyle,
    pub list_item: TextStyle,
    pub toc_chapter: TextStyle,
    pub toc_entry: TextStyle,
    pub book_title: TextStyle,
    pub book_subtitle: TextStyle,
    pub chapter: TextStyle,
    pub accent: Color,
    /// Width of the photo beside the title, in px.
    pub side_image_width: f32,
}

const TEXT: &str = "#333333";
const TITLE: &str = "#2c3e50";
const MUTED: &str = "#666666";

impl Theme {
    /// Standalone single-recipe export.
    pub fn single() -> Self {
        let text = Color::hex(TEXT);
        Self {
            title: TextStyle::new(24.0, true, Color::hex(TITLE), 1.3),
            meta: TextStyle::new(12.0, false, Color::hex(MUTED), 1.4),
            headings: [
                TextStyle::new(18.0, true, text, 1.3),
                TextStyle::new(16.0, true, text, 1.3),
                TextStyle::new(14.0, true, text, 1.3),
            ],
            body: TextStyle::new(16.0, false, text, 1.6),
            list_item: TextStyle::new(16.0, false, text, 1.4).indented(20.0),
            toc_chapter: TextStyle::new(16.0, true, Color::hex(TITLE), 1.4),
            toc_entry: TextStyle::new(12.0, false, text, 1.4).indented(10.0),
            book_title: TextStyle::new(28.0, true, Color::hex(TITLE), 1.3).centered(),
            book_subtitle: TextStyle::new(14.0, false, Color::hex(MUTED), 1.4).centered(),
            chapter: TextStyle::new(26.0, true, Color::hex(TITLE), 1.3).centered(),
            accent: Color::hex("#4caf50"),
            side_image_width: 200.0,
        }
    }

    /// Compiled booklet: same hierarchy, slightly smaller type.
    pub fn book() -> Self {
        let base = Self::single();
        Self {
            title: TextStyle {
                font_size: 22.0,
                ..base.title
            },
            meta: TextStyle {
                font_size: 11.0,
                ..base.meta
            },
            headings: [
                TextStyle {
                    font_size: 17.0,
                    ..base.headings[0]
                },
                TextStyle {
                    font_size: 15.0,
                    ..base.headings[1]
                },
                TextStyle {
                    font_size: 13.0,
                    ..base.headings[2]
                },
            ],
            body: TextStyle {
                font_size: 14.0,
                ..base.body
            },
            list_item: TextStyle {
                font_size: 14.0,
                ..base.list_item
            },
            side_image_width: 150.0,
            ..base
        }
    }

    /// Style for a markup heading of `level` (2–4); out-of-range levels clamp.
    pub fn heading(&self, level: u8) -> TextStyle {
        let idx = usize::from(level.clamp(2, 4) - 2);
        self.headings[idx]
    }
}
