//! Recipe records: front-matter parsing, serialisation, loading from a
//! recipe directory and file-name slugs.
//!
//! A recipe file looks like:
//!
//! ```text
//! ---
//! title: Овесена каша
//! mealType: breakfast
//! author: Мария
//! photo: images/oats.jpg
//! ---
//!
//! ## Продукти
//! - 50 г овесени ядки
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ExportError, Result};

/// Meal type assumed when the front matter does not name one.
pub const DEFAULT_MEAL_TYPE: &str = "breakfast";

/// Maximum number of characters kept in a slug.
pub const SLUG_MAX_CHARS: usize = 50;

/// A parsed recipe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipe {
    /// File stem of the source file.
    pub id: String,
    pub title: String,
    pub meal_type: String,
    pub author: String,
    /// Photo location (file path or data URI). `image` is accepted as an alias.
    pub photo: Option<String>,
    /// Free-form markup content.
    pub content: String,
}

impl Recipe {
    /// Parse a recipe file. Missing or malformed front matter never fails:
    /// the defaults are used and the whole input becomes the content.
    pub fn parse(id: impl Into<String>, markdown: &str) -> Self {
        let id = id.into();
        let Some((front, content)) = split_front_matter(markdown) else {
            return Self {
                id,
                meal_type: DEFAULT_MEAL_TYPE.to_string(),
                content: markdown.trim().to_string(),
                ..Self::default()
            };
        };

        let mut meta: HashMap<&str, &str> = HashMap::new();
        for line in front.lines() {
            if let Some(colon) = line.find(':') {
                if colon > 0 {
                    meta.insert(line[..colon].trim(), line[colon + 1..].trim());
                }
            }
        }
        let field = |key: &str| meta.get(key).copied().filter(|v| !v.is_empty());

        Self {
            id,
            title: field("title").unwrap_or_default().to_string(),
            meal_type: field("mealType").unwrap_or(DEFAULT_MEAL_TYPE).to_string(),
            author: field("author").unwrap_or_default().to_string(),
            photo: field("photo").or_else(|| field("image")).map(str::to_string),
            content: content.trim().to_string(),
        }
    }

    /// Serialise back to the front-matter format understood by [`Recipe::parse`].
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!("title: {}\n", self.title));
        out.push_str(&format!("mealType: {}\n", self.meal_type));
        out.push_str(&format!("author: {}\n", self.author));
        if let Some(photo) = &self.photo {
            out.push_str(&format!("photo: {photo}\n"));
        }
        out.push_str("---\n\n");
        out.push_str(&self.content);
        out
    }
}

/// Split `---\n<front>\n---\n<content>`; `None` when the input does not open
/// with a delimiter line or the block is never closed.
fn split_front_matter(input: &str) -> Option<(&str, &str)> {
    let first_nl = input.find('\n')?;
    if input[..first_nl].trim_end() != "---" {
        return None;
    }
    let body = &input[first_nl + 1..];

    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare.starts_with("---") && bare[3..].trim().is_empty() {
            let front = body[..offset].trim_end_matches(['\n', '\r']);
            return Some((front, &body[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// File-name friendly form of a title: lowercase, only latin/cyrillic letters,
/// digits, whitespace and hyphens kept, whitespace runs become one hyphen,
/// truncated to [`SLUG_MAX_CHARS`] characters.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || ('а'..='я').contains(c)
                || c.is_whitespace()
                || *c == '-'
        })
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.push(c);
            in_space = false;
        }
    }
    slug.chars().take(SLUG_MAX_CHARS).collect()
}

/// Source file name for a new recipe with this title.
pub fn markdown_filename(title: &str) -> String {
    format!("{}.md", slugify(title))
}

/// Load `<dir>/<id>.md`.
pub async fn load_recipe(dir: &Path, id: &str) -> Result<Recipe> {
    let path = dir.join(format!("{id}.md"));
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(Recipe::parse(id, &text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExportError::RecipeNotFound { id: id.to_string() })
        }
        Err(e) => Err(e.into()),
    }
}

/// Load a single recipe file; the id is the file stem.
pub async fn load_recipe_file(path: &Path) -> Result<Recipe> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Recipe::parse(id, &text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExportError::RecipeNotFound { id })
        }
        Err(e) => Err(e.into()),
    }
}

/// Load every `*.md` file in `dir`, ordered by file name.
pub async fn load_recipes(dir: &Path) -> Result<Vec<Recipe>> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut recipes = Vec::with_capacity(paths.len());
    for path in &paths {
        recipes.push(load_recipe_file(path).await?);
    }
    log::debug!("loaded {} recipes from '{}'", recipes.len(), dir.display());
    Ok(recipes)
}
