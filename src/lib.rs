//! # recipe-press – paginated PDF export for recipes
//!
//! Recipes are markdown files with a small front-matter block. The export
//! pipeline stages are:
//!
//! 1. **Parse** – front matter + content → [`recipe::Recipe`]
//! 2. **Translate** – content markup → blocks ([`markup`])
//! 3. **Measure** – typeset blocks at the page width ([`layout`], [`fonts`], [`style`])
//! 4. **Paginate** – soft-threshold page splitting ([`pagination`])
//! 5. **Rasterize** – lay each page out on the off-screen surface and capture
//!    it with oversampled images ([`surface`], [`raster`], [`images`])
//! 6. **Compose** – place captures on physical pages, emit PDF bytes ([`render`])
//!
//! [`pipeline::Exporter`] runs the single-recipe export and the two-pass book
//! export ([`book`]).

pub mod book;
pub mod capture;
pub mod category;
pub mod config;
pub mod error;
pub mod fonts;
pub mod images;
pub mod layout;
pub mod markup;
pub mod pagination;
pub mod pipeline;
pub mod raster;
pub mod recipe;
pub mod render;
pub mod style;
pub mod surface;

// Re-exports for convenience
pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use pipeline::{ExportedPdf, Exporter};
pub use recipe::Recipe;
