//! Book structure: category chapters, title page and the table of contents.
//!
//! Page numbers are resolved in two passes. Pass 1 numbers content pages from
//! 1 at the first chapter page. Once the table of contents has been split the
//! final numbers are the provisional ones shifted by the title page plus the
//! TOC page count ([`toc_offset`]).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::category::CategoryCatalog;
use crate::config::Labels;
use crate::layout::{BannerRole, FlowItem};
use crate::markup::Block;
use crate::pagination::Page;
use crate::recipe::Recipe;

/// Offset assumed while sizing the TOC: one title page and one TOC page.
pub const ASSUMED_OFFSET: usize = 2;

/// Recipes of one category, in chapter order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeGroup<'r> {
    pub key: String,
    pub label: String,
    pub recipes: Vec<&'r Recipe>,
}

/// Where a recipe's first page landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipePageEntry {
    pub title: String,
    pub category: String,
    pub page: usize,
}

/// Case-insensitive title order; ties fall back to the raw titles.
pub fn title_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Group recipes by meal type. Groups follow the catalog order (unknown keys
/// last, alphabetically); recipes within a group are ordered by title.
pub fn group_recipes<'r>(recipes: &'r [Recipe], catalog: &CategoryCatalog) -> Vec<RecipeGroup<'r>> {
    let mut by_key: BTreeMap<&str, Vec<&'r Recipe>> = BTreeMap::new();
    for recipe in recipes {
        by_key.entry(recipe.meal_type.as_str()).or_default().push(recipe);
    }

    let mut groups: Vec<RecipeGroup<'r>> = by_key
        .into_iter()
        .map(|(key, mut recipes)| {
            recipes.sort_by(|a, b| title_order(&a.title, &b.title));
            RecipeGroup {
                key: key.to_string(),
                label: catalog.label(key).to_string(),
                recipes,
            }
        })
        .collect();
    groups.sort_by(|a, b| catalog.compare_keys(&a.key, &b.key));
    groups
}

/// Offset from provisional to final page numbers for a TOC of `toc_pages`.
pub fn toc_offset(toc_pages: usize) -> usize {
    1 + toc_pages
}

pub fn shift_entries(entries: &[RecipePageEntry], offset: usize) -> Vec<RecipePageEntry> {
    entries
        .iter()
        .map(|e| RecipePageEntry {
            page: e.page + offset,
            ..e.clone()
        })
        .collect()
}

/// Flow of the table of contents: heading, then per chapter a sub-heading and
/// numbered entries. Numbering runs across chapters.
pub fn toc_items(heading: &str, entries: &[RecipePageEntry], catalog: &CategoryCatalog) -> Vec<FlowItem> {
    let mut items = vec![FlowItem::Block(Block::Heading {
        level: 2,
        text: heading.to_string(),
    })];
    let mut current: Option<&str> = None;
    for (i, entry) in entries.iter().enumerate() {
        if current != Some(entry.category.as_str()) {
            current = Some(entry.category.as_str());
            items.push(FlowItem::TocChapter(catalog.label(&entry.category).to_string()));
        }
        items.push(FlowItem::TocEntry {
            number: i + 1,
            title: entry.title.clone(),
            page: entry.page,
        });
    }
    items
}

pub fn title_page(labels: &Labels, recipe_count: usize) -> Page {
    Page::centered(vec![
        FlowItem::Banner {
            text: labels.book_title.clone(),
            role: BannerRole::BookTitle,
        },
        FlowItem::Banner {
            text: format!("{}{recipe_count}", labels.recipe_count_prefix),
            role: BannerRole::BookSubtitle,
        },
    ])
}

/// Chapter separator: the category label over an accent rule.
pub fn chapter_page(label: &str) -> Page {
    Page::centered(vec![
        FlowItem::Banner {
            text: label.to_string(),
            role: BannerRole::Chapter,
        },
        FlowItem::Rule,
    ])
}
