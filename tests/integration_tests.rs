//! Integration tests for the recipe export pipeline.
//!
//! These tests validate:
//! - Translation and front-matter parsing of real recipe files
//! - PDF output exists and has valid format for both exports
//! - Book chapter order and two-pass page numbering
//! - Best-effort image loading and surface release on failure

use std::path::{Path, PathBuf};
use std::time::Duration;

use recipe_press::capture::PageCapture;
use recipe_press::config::{ExportConfig, PageGeometry};
use recipe_press::error::ExportError;
use recipe_press::fonts::{FontManager, FontSources};
use recipe_press::images::{FileImageLoader, ImageLoader};
use recipe_press::layout::{PinnedHeader, Typesetter};
use recipe_press::markup::{translate, Block, Span};
use recipe_press::pagination::Page;
use recipe_press::pipeline::{recipe_flow, Exporter};
use recipe_press::raster::Rasterizer;
use recipe_press::recipe::{load_recipe, load_recipes, slugify, Recipe};
use recipe_press::render::compose_pdf;
use recipe_press::style::Theme;

// =====================================================================
// Helper
// =====================================================================

fn exporter() -> Exporter<FileImageLoader> {
    Exporter::with_fonts(
        ExportConfig::default().without_delays(),
        FontManager::default(),
        FileImageLoader::default(),
    )
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn recipe(meal_type: &str, title: &str) -> Recipe {
    Recipe::parse(
        slugify(title),
        &format!(
            "---\ntitle: {title}\nmealType: {meal_type}\nauthor: Тест\n---\n\n## Продукти\n- 1 ч.ч. ориз\n- **2** яйца\n\nРазбъркайте и печете."
        ),
    )
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn write_png(path: &Path, w: u32, h: u32) {
    image::RgbImage::from_pixel(w, h, image::Rgb([10, 120, 40]))
        .save(path)
        .unwrap();
}

/// An image whose load never completes.
struct NeverLoads;

impl ImageLoader for NeverLoads {
    async fn load(&self, _src: &str) -> recipe_press::Result<Vec<u8>> {
        std::future::pending().await
    }
}

// =====================================================================
// Translation & parsing
// =====================================================================

#[test]
fn translate_heading_break_and_bold() {
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
fn slug_keeps_cyrillic_and_digits() {
    assert_eq!(slugify("Пиле с ориз! 2024"), "пиле-с-ориз-2024");
}

#[tokio::test]
async fn missing_recipe_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_recipe(dir.path(), "няма-такава").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Рецептата не е намерена: няма-такава");
}

#[tokio::test]
async fn recipes_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    for r in [recipe("lunch", "Супа"), recipe("dessert", "Торта")] {
        std::fs::write(dir.path().join(format!("{}.md", r.id)), r.to_markdown()).unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    let loaded = load_recipes(dir.path()).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded.iter().any(|r| r.title == "Торта" && r.meal_type == "dessert"));
}

// =====================================================================
// Single-recipe export
// =====================================================================

#[tokio::test]
async fn single_export_with_photo() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("photo.png"), 64, 48);
    let mut r = recipe("dinner", "Мусака");
    r.photo = Some("photo.png".into());

    let exporter = Exporter::with_fonts(
        ExportConfig::default().without_delays(),
        FontManager::default(),
        FileImageLoader::new(dir.path()),
    );
    let pdf = exporter.export_recipe(&r).await.unwrap();
    assert_valid_pdf(&pdf.bytes);
    assert_eq!(pdf.page_count, 1);
    assert_eq!(pdf.file_name, "Успяваме-заедно-рецепта-мусака.pdf");
}

#[tokio::test]
async fn long_recipe_spans_several_pages() {
    let mut r = recipe("lunch", "Дълга");
    r.content = (1..=120)
        .map(|i| format!("Стъпка {i}: разбъркайте добре и оставете да почине."))
        .collect::<Vec<_>>()
        .join("\n");
    let pdf = exporter().export_recipe(&r).await.unwrap();
    assert_valid_pdf(&pdf.bytes);
    assert!(pdf.page_count > 1, "expected several pages, got {}", pdf.page_count);
}

#[tokio::test]
async fn embedded_font_exports_cyrillic_text() {
    let mut config = ExportConfig::default().without_delays();
    config.fonts = FontSources {
        regular: Some(fixture("RobotoMedium.ttf")),
        bold: None,
    };
    let embedded = Exporter::new(config, FileImageLoader::default()).await.unwrap();
    let r = recipe("lunch", "Боб чорба");

    let pdf = embedded.export_recipe(&r).await.unwrap();
    assert_valid_pdf(&pdf.bytes);
    assert_eq!(pdf.page_count, 1);
    // The font program travels with the document.
    let builtin = exporter().export_recipe(&r).await.unwrap();
    assert!(
        pdf.bytes.len() > builtin.bytes.len(),
        "embedded {} bytes vs builtin {} bytes",
        pdf.bytes.len(),
        builtin.bytes.len()
    );

    let book = embedded.export_book(&[r]).await.unwrap();
    assert_valid_pdf(&book.bytes);
    assert_eq!(book.page_count, 1 + book.toc_pages + 2);
}

#[tokio::test]
async fn never_loading_image_is_released_by_timeout() {
    let mut config = ExportConfig::default().without_delays();
    config.image_timeout_ms = 50;
    let exporter = Exporter::with_fonts(config, FontManager::default(), NeverLoads);
    let mut r = recipe("snack", "Сандвич");
    r.photo = Some("https://example.org/never.jpg".into());

    let pdf = tokio::time::timeout(Duration::from_secs(10), exporter.export_recipe(&r))
        .await
        .expect("export must finish within the bounded wait")
        .unwrap();
    assert_valid_pdf(&pdf.bytes);
}

#[tokio::test]
async fn failing_layout_aborts_the_export() {
    let mut config = ExportConfig::default().without_delays();
    config.single.logical_width_px = 30.0;
    let exporter = Exporter::with_fonts(config, FontManager::default(), FileImageLoader::default());
    let err = exporter
        .export_recipe(&recipe("lunch", "Провал"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Layout(_)), "unexpected error: {err}");
}

// =====================================================================
// Book export
// =====================================================================

#[tokio::test]
async fn book_groups_and_numbers_recipes() {
    let recipes = vec![
        recipe("lunch", "B"),
        recipe("breakfast", "A"),
        recipe("breakfast", "Z"),
    ];
    let pdf = exporter().export_book(&recipes).await.unwrap();
    assert_valid_pdf(&pdf.bytes);
    assert_eq!(pdf.file_name, "Успяваме-заедно-всички-рецепти-2025.pdf");

    let t = pdf.toc_pages;
    assert_eq!(t, 1);
    let order: Vec<_> = pdf
        .entries
        .iter()
        .map(|e| (e.category.as_str(), e.title.as_str()))
        .collect();
    assert_eq!(order, [("breakfast", "A"), ("breakfast", "Z"), ("lunch", "B")]);

    // Pass 1: chapter 1, A 2, Z 3, chapter 4, B 5 – shifted by title + TOC.
    let pages: Vec<_> = pdf.entries.iter().map(|e| e.page).collect();
    assert_eq!(pages, [2 + 1 + t, 3 + 1 + t, 5 + 1 + t]);
    // Title + TOC + two chapter pages + one page per recipe.
    assert_eq!(pdf.page_count, 1 + t + 2 + 3);
}

#[tokio::test]
async fn long_table_of_contents_shifts_every_entry() {
    let recipes: Vec<Recipe> = (0..60)
        .map(|i| {
            let category = ["breakfast", "lunch", "dinner"][i % 3];
            recipe(category, &format!("Рецепта номер {i:02}"))
        })
        .collect();
    let pdf = exporter().export_book(&recipes).await.unwrap();
    assert_valid_pdf(&pdf.bytes);

    let t = pdf.toc_pages;
    assert!(t > 1, "60 entries should not fit on one A5 page");
    assert_eq!(pdf.page_count, 1 + t + 3 + 60);
    // First recipe follows the first chapter page.
    assert_eq!(pdf.entries[0].page, 2 + 1 + t);
    // Each recipe occupies one page; chapters add one page each.
    for pair in pdf.entries.windows(2) {
        let step = pair[1].page - pair[0].page;
        let new_chapter = pair[0].category != pair[1].category;
        assert_eq!(step, if new_chapter { 2 } else { 1 });
    }
    assert_eq!(pdf.entries.last().unwrap().page, pdf.page_count);
}

#[tokio::test]
async fn empty_book_still_has_title_and_toc() {
    let pdf = exporter().export_book(&[]).await.unwrap();
    assert_valid_pdf(&pdf.bytes);
    assert_eq!(pdf.page_count, 2);
    assert!(pdf.entries.is_empty());
}

// =====================================================================
// Captures
// =====================================================================

#[tokio::test]
async fn capture_json_roundtrip_renders() {
    let fonts = FontManager::default();
    let theme = Theme::single();
    let config = ExportConfig::default().without_delays();
    let geometry = PageGeometry::a4();
    let loader = FileImageLoader::default();
    let mut rasterizer = Rasterizer::new(
        &loader,
        Typesetter::new(&fonts, &theme),
        config.raster_settings(&geometry),
    );
    let page = Page {
        header: Some(PinnedHeader {
            title: "Плодова салата".into(),
            meta: vec!["Тип: Десерт".into()],
            image: None,
        }),
        items: recipe_flow(&recipe("dessert", "x")),
        centered: false,
    };
    let capture = rasterizer.rasterize(&page).await.unwrap();
    assert!(!rasterizer.surface().is_attached());
    assert_eq!(capture.width_px, 794 * 2);

    let parsed = PageCapture::from_json(&capture.to_json()).unwrap();
    assert_eq!(parsed.height_px, capture.height_px);
    assert_eq!(parsed.boxes.len(), capture.boxes.len());
    let bytes = compose_pdf(&[parsed], &geometry, "roundtrip", &fonts).unwrap();
    assert_valid_pdf(&bytes);
}

#[tokio::test]
async fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("press.json");
    std::fs::write(&path, r#"{ "scale": 3, "book": { "width_mm": 148, "height_mm": 210, "margin_mm": 12, "logical_width_px": 500 } }"#).unwrap();
    let config = ExportConfig::load(&path).await.unwrap();
    assert_eq!(config.scale, 3);
    assert_eq!(config.book.margin_mm, 12.0);
    assert_eq!(config.single, PageGeometry::a4());
}
