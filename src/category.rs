//! Category (meal type) vocabulary: display labels and the canonical chapter
//! order used by the book export.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub key: String,
    pub label: String,
}

/// Ordered key → label mapping. Position in the list is the canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog {
    entries: Vec<CategoryEntry>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::from_pairs(&[
            ("breakfast", "Закуска"),
            ("lunch", "Обяд"),
            ("dinner", "Вечеря"),
            ("snack", "Междинно хранене"),
            ("dessert", "Десерт"),
        ])
    }
}

impl CategoryCatalog {
    pub fn new(entries: Vec<CategoryEntry>) -> Self {
        Self { entries }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(key, label)| CategoryEntry {
                    key: key.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Display label for `key`; unknown keys are their own label.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.label.as_str())
            .unwrap_or(key)
    }

    /// Canonical position of a known key.
    pub fn rank(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Chapter order: known keys by rank, then unknown keys alphabetically.
    pub fn compare_keys(&self, a: &str, b: &str) -> Ordering {
        match (self.rank(a), self.rank(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

/// Catalog of the meal types actually used by `recipes`, sorted by key, with
/// labels looked up in `base`.
pub fn catalog_from_recipes(recipes: &[Recipe], base: &CategoryCatalog) -> CategoryCatalog {
    let keys: BTreeSet<&str> = recipes
        .iter()
        .map(|r| r.meal_type.as_str())
        .filter(|k| !k.is_empty())
        .collect();
    CategoryCatalog {
        entries: keys
            .into_iter()
            .map(|key| CategoryEntry {
                key: key.to_string(),
                label: base.label(key).to_string(),
            })
            .collect(),
    }
}
