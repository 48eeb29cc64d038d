//! Pipeline – ties together translation, measurement, pagination,
//! rasterization and composition into the two export operations.

use crate::book::{
    chapter_page, group_recipes, shift_entries, title_page, toc_items, toc_offset,
    RecipePageEntry, ASSUMED_OFFSET,
};
use crate::capture::PageCapture;
use crate::category::CategoryCatalog;
use crate::config::{ExportConfig, Labels};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::images::ImageLoader;
use crate::layout::{FlowItem, LayoutMeasurer, PinnedHeader, Typesetter};
use crate::markup::translate;
use crate::pagination::{paginate_document, Page, SplitParams};
use crate::raster::Rasterizer;
use crate::recipe::Recipe;
use crate::render::compose_pdf;
use crate::style::Theme;

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Table-of-contents pages (book export only).
    pub toc_pages: usize,
    /// Final first-page numbers per recipe (book export only).
    pub entries: Vec<RecipePageEntry>,
}

/// Pinned header of a recipe: title, meal type and author lines, photo.
pub fn recipe_header(recipe: &Recipe, catalog: &CategoryCatalog, labels: &Labels) -> PinnedHeader {
    let mut meta = vec![format!(
        "{}{}",
        labels.meal_type_prefix,
        catalog.label(&recipe.meal_type)
    )];
    if !recipe.author.is_empty() {
        meta.push(format!("{}{}", labels.author_prefix, recipe.author));
    }
    PinnedHeader {
        title: recipe.title.clone(),
        meta,
        image: recipe.photo.clone().filter(|p| !p.is_empty()),
    }
}

/// Measure `items` at `content_width` and split them into pages of height
/// `page_height`. Works with any [`LayoutMeasurer`].
pub fn split_flow(
    header: Option<PinnedHeader>,
    header_height: f32,
    items: Vec<FlowItem>,
    measurer: &dyn LayoutMeasurer,
    content_width: f32,
    page_height: f32,
) -> Vec<Page> {
    let measured: Vec<(FlowItem, f32)> = items
        .into_iter()
        .map(|item| {
            let h = measurer.measure(&item, content_width);
            (item, h)
        })
        .collect();
    paginate_document(header, header_height, measured, &SplitParams::new(page_height))
}

/// Recipe content as flow items.
pub fn recipe_flow(recipe: &Recipe) -> Vec<FlowItem> {
    translate(&recipe.content)
        .into_iter()
        .map(FlowItem::Block)
        .collect()
}

/// Runs exports against one configuration. Constructing an exporter loads the
/// configured fonts, so every export starts with fonts ready.
pub struct Exporter<L> {
    config: ExportConfig,
    fonts: FontManager,
    loader: L,
}

impl<L: ImageLoader> Exporter<L> {
    pub async fn new(config: ExportConfig, loader: L) -> Result<Self> {
        let fonts = FontManager::load(&config.fonts).await?;
        Ok(Self::with_fonts(config, fonts, loader))
    }

    pub fn with_fonts(config: ExportConfig, fonts: FontManager, loader: L) -> Self {
        Self {
            config,
            fonts,
            loader,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export one recipe as a standalone document.
    pub async fn export_recipe(&self, recipe: &Recipe) -> Result<ExportedPdf> {
        let result = self.render_recipe(recipe).await;
        if let Err(e) = &result {
            log::error!("export of recipe '{}' failed: {e}", recipe.id);
        }
        result
    }

    /// Export every recipe as a book with chapters and a table of contents.
    pub async fn export_book(&self, recipes: &[Recipe]) -> Result<ExportedPdf> {
        let result = self.render_book(recipes).await;
        if let Err(e) = &result {
            log::error!("book export failed: {e}");
        }
        result
    }

    async fn render_recipe(&self, recipe: &Recipe) -> Result<ExportedPdf> {
        let theme = Theme::single();
        let typesetter = Typesetter::new(&self.fonts, &theme);
        let geometry = self.config.single;
        let mut rasterizer = Rasterizer::new(
            &self.loader,
            typesetter,
            self.config.raster_settings(&geometry),
        );

        let pages = self.split_recipe(&mut rasterizer, &typesetter, recipe).await;
        let captures = rasterize_all(&mut rasterizer, &pages).await?;
        let bytes = compose_pdf(&captures, &geometry, &recipe.title, &self.fonts)?;

        log::info!(
            "exported recipe '{}': {} page(s), {} bytes",
            recipe.id,
            captures.len(),
            bytes.len()
        );
        Ok(ExportedPdf {
            file_name: self.config.labels.recipe_file_name(&recipe.title),
            bytes,
            page_count: captures.len(),
            toc_pages: 0,
            entries: Vec::new(),
        })
    }

    async fn render_book(&self, recipes: &[Recipe]) -> Result<ExportedPdf> {
        let theme = Theme::book();
        let typesetter = Typesetter::new(&self.fonts, &theme);
        let geometry = self.config.book;
        let labels = &self.config.labels;
        let catalog = &self.config.categories;
        let mut rasterizer = Rasterizer::new(
            &self.loader,
            typesetter,
            self.config.raster_settings(&geometry),
        );

        // Pass 1: content with provisional numbers.
        let mut content: Vec<PageCapture> = Vec::new();
        let mut entries: Vec<RecipePageEntry> = Vec::new();
        let groups = group_recipes(recipes, catalog);
        for group in &groups {
            content.push(rasterizer.rasterize(&chapter_page(&group.label)).await?);
            for recipe in &group.recipes {
                entries.push(RecipePageEntry {
                    title: recipe.title.clone(),
                    category: group.key.clone(),
                    page: content.len() + 1,
                });
                let pages = self.split_recipe(&mut rasterizer, &typesetter, recipe).await;
                content.extend(rasterize_all(&mut rasterizer, &pages).await?);
            }
        }

        // Size the TOC against the assumed offset.
        let provisional = shift_entries(&entries, ASSUMED_OFFSET);
        let sized = self
            .split_toc(&rasterizer, &typesetter, &provisional)
            .await
            .len();

        // Pass 2: shift once, re-split.
        let entries = shift_entries(&entries, toc_offset(sized));
        let toc = self.split_toc(&rasterizer, &typesetter, &entries).await;
        if toc.len() != sized {
            log::warn!(
                "table of contents changed from {sized} to {} page(s) after renumbering; \
                 listed page numbers may be off by {}",
                toc.len(),
                toc.len().abs_diff(sized)
            );
        }

        let mut captures = Vec::with_capacity(1 + toc.len() + content.len());
        captures.push(rasterizer.rasterize(&title_page(labels, recipes.len())).await?);
        captures.extend(rasterize_all(&mut rasterizer, &toc).await?);
        captures.extend(content);

        let bytes = compose_pdf(&captures, &geometry, &labels.book_title, &self.fonts)?;
        log::info!(
            "exported book: {} recipe(s) in {} chapter(s), {} page(s) ({} TOC), {} bytes",
            recipes.len(),
            groups.len(),
            captures.len(),
            toc.len(),
            bytes.len()
        );
        Ok(ExportedPdf {
            file_name: labels.book_file_name.clone(),
            bytes,
            page_count: captures.len(),
            toc_pages: toc.len(),
            entries,
        })
    }

    /// Header, settle, measure and split one recipe.
    async fn split_recipe(
        &self,
        rasterizer: &mut Rasterizer<'_, L>,
        typesetter: &Typesetter<'_>,
        recipe: &Recipe,
    ) -> Vec<Page> {
        let header = recipe_header(recipe, &self.config.categories, &self.config.labels);
        rasterizer.prepare(&header.image.iter().cloned().collect::<Vec<_>>()).await;
        rasterizer.settle_document().await;

        let header_height = rasterizer.header_height(&header);
        let pages = split_flow(
            Some(header),
            header_height,
            recipe_flow(recipe),
            typesetter,
            rasterizer.content_width(),
            rasterizer.settings().page_height,
        );
        log::debug!("recipe '{}' split into {} page(s)", recipe.id, pages.len());
        pages
    }

    async fn split_toc(
        &self,
        rasterizer: &Rasterizer<'_, L>,
        typesetter: &Typesetter<'_>,
        entries: &[RecipePageEntry],
    ) -> Vec<Page> {
        let items = toc_items(&self.config.labels.toc_heading, entries, &self.config.categories);
        rasterizer.settle_document().await;
        split_flow(
            None,
            0.0,
            items,
            typesetter,
            rasterizer.content_width(),
            rasterizer.settings().page_height,
        )
    }
}

async fn rasterize_all<L: ImageLoader>(
    rasterizer: &mut Rasterizer<'_, L>,
    pages: &[Page],
) -> Result<Vec<PageCapture>> {
    let mut captures = Vec::with_capacity(pages.len());
    for page in pages {
        captures.push(rasterizer.rasterize(page).await?);
    }
    Ok(captures)
}
