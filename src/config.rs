//! Export configuration, loadable from JSON. Every field has a default, so an
//! empty object (or no file at all) yields the stock exports.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::category::CategoryCatalog;
use crate::error::Result;
use crate::fonts::FontSources;
use crate::raster::RasterSettings;
use crate::recipe::slugify;

/// Physical page format of one export mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    /// Logical width `W` the page content is rendered at.
    pub logical_width_px: f32,
}

impl PageGeometry {
    /// Standalone recipe: A4 with 10 mm margins.
    pub const fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
            logical_width_px: 794.0,
        }
    }

    /// Book: A5 booklet with 8 mm margins.
    pub const fn a5() -> Self {
        Self {
            width_mm: 148.0,
            height_mm: 210.0,
            margin_mm: 8.0,
            logical_width_px: 559.0,
        }
    }

    pub fn content_width_mm(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn content_height_mm(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }

    /// Page height `H` in logical px, keeping the content area's aspect ratio.
    pub fn page_height_px(&self) -> f32 {
        self.logical_width_px * self.content_height_mm() / self.content_width_mm()
    }
}

/// User-visible strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub meal_type_prefix: String,
    pub author_prefix: String,
    pub book_title: String,
    pub recipe_count_prefix: String,
    pub toc_heading: String,
    pub recipe_file_prefix: String,
    pub book_file_name: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            meal_type_prefix: "Тип: ".into(),
            author_prefix: "Автор: ".into(),
            book_title: "Книга със здравословни рецепти".into(),
            recipe_count_prefix: "Общо рецепти: ".into(),
            toc_heading: "Съдържание".into(),
            recipe_file_prefix: "Успяваме-заедно-рецепта-".into(),
            book_file_name: "Успяваме-заедно-всички-рецепти-2025.pdf".into(),
        }
    }
}

impl Labels {
    /// File name for a single-recipe export.
    pub fn recipe_file_name(&self, title: &str) -> String {
        format!("{}{}.pdf", self.recipe_file_prefix, slugify(title))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub single: PageGeometry,
    pub book: PageGeometry,
    /// Oversampling factor `S`.
    pub scale: u32,
    pub image_timeout_ms: u64,
    /// Settle delay before a document is split.
    pub settle_ms: u64,
    /// Settle delay before each page is captured.
    pub page_settle_ms: u64,
    pub fonts: FontSources,
    pub categories: CategoryCatalog,
    pub labels: Labels,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            single: PageGeometry::a4(),
            book: PageGeometry::a5(),
            scale: 2,
            image_timeout_ms: 5000,
            settle_ms: 200,
            page_settle_ms: 100,
            fonts: FontSources::default(),
            categories: CategoryCatalog::default(),
            labels: Labels::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Same configuration with every settle delay removed.
    pub fn without_delays(mut self) -> Self {
        self.settle_ms = 0;
        self.page_settle_ms = 0;
        self
    }

    /// Rasterization parameters for a page format.
    pub fn raster_settings(&self, geometry: &PageGeometry) -> RasterSettings {
        RasterSettings {
            logical_width: geometry.logical_width_px,
            page_height: geometry.page_height_px(),
            scale: self.scale,
            image_timeout: Duration::from_millis(self.image_timeout_ms),
            page_settle: Duration::from_millis(self.page_settle_ms),
            document_settle: Duration::from_millis(self.settle_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_heights_follow_content_aspect() {
        let a4 = PageGeometry::a4();
        assert!((a4.page_height_px() - 794.0 * 277.0 / 190.0).abs() < 0.01);
        let a5 = PageGeometry::a5();
        assert!((a5.page_height_px() - 559.0 * 194.0 / 132.0).abs() < 0.01);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ExportConfig::from_json(
            r#"{ "scale": 3, "labels": { "toc_heading": "Contents" },
                 "categories": [{ "key": "soup", "label": "Супи" }] }"#,
        )
        .unwrap();
        assert_eq!(cfg.scale, 3);
        assert_eq!(cfg.labels.toc_heading, "Contents");
        assert_eq!(cfg.labels.author_prefix, "Автор: ");
        assert_eq!(cfg.categories.label("soup"), "Супи");
        assert_eq!(cfg.single, PageGeometry::a4());
        assert!(ExportConfig::from_json("{ \"scale\": \"x\" }").is_err());
    }

    #[test]
    fn recipe_file_name_uses_slug() {
        let labels = Labels::default();
        assert_eq!(
            labels.recipe_file_name("Пиле с ориз! 2024"),
            "Успяваме-заедно-рецепта-пиле-с-ориз-2024.pdf"
        );
    }
}
