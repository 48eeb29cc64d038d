//! Page captures – the intermediate representation between the rasterizer
//! and the PDF compositor. A capture is one page rendered at a fixed logical
//! width and oversampled by an integer factor: pixel dimensions describe the
//! oversampled bitmap, box geometry is in logical pixels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One rasterized page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCapture {
    /// Bitmap width in device pixels (logical width × scale).
    pub width_px: u32,
    /// True rendered bitmap height in device pixels.
    pub height_px: u32,
    /// Oversampling factor.
    pub scale: u32,
    pub boxes: Vec<LayoutBox>,
    /// Oversampled image data keyed by source.
    #[serde(default)]
    pub images: BTreeMap<String, RasterImage>,
}

/// A positioned rectangle with optional content, in logical pixels relative
/// to the capture's top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub color: [f32; 4],
    pub line_height: f32,
    /// List bullet/number prefix (e.g. "• " or "1. "), drawn left of the box.
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub runs: Vec<TextRun>,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
}

/// Text of a single weight within a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// X offset within the layout box
    pub x_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

/// Encoded (PNG) image resampled to its on-page size × scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterImage {
    pub px_width: u32,
    pub px_height: u32,
    pub png: Vec<u8>,
}

impl PageCapture {
    /// Logical (un-oversampled) width.
    pub fn logical_width(&self) -> f32 {
        self.width_px as f32 / self.scale.max(1) as f32
    }

    /// Logical (un-oversampled) height.
    pub fn logical_height(&self) -> f32 {
        self.height_px as f32 / self.scale.max(1) as f32
    }

    /// Physical length units per logical pixel when the capture spans
    /// `content_width` physical units.
    pub fn units_per_px(&self, content_width: f32) -> f32 {
        let w = self.logical_width();
        if w > 0.0 {
            content_width / w
        } else {
            0.0
        }
    }

    /// `(height_px / S) · (content_width / (width_px / S))`.
    pub fn physical_height(&self, content_width: f32) -> f32 {
        self.logical_height() * self.units_per_px(content_width)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    /// Shift this box and its subtree.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// Visit this box and every descendant.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a LayoutBox)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}
