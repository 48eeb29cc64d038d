//! Error types for recipe export.

use thiserror::Error;

/// User-facing notice shown when an export aborts.
pub const EXPORT_FAILED_NOTICE: &str =
    "Грешка при генериране на PDF файла. Моля, опитайте отново.";

/// Errors that can occur while loading recipes or exporting PDFs.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Рецептата не е намерена: {id}")]
    RecipeNotFound { id: String },

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn layout(msg: impl std::fmt::Display) -> Self {
        Self::Layout(msg.to_string())
    }

    /// True for the non-fatal "resource missing" class of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecipeNotFound { .. })
    }

    /// What the user is told. A missing recipe is reported on its own; any
    /// other failure gets the export-failed notice followed by the cause.
    pub fn user_message(&self) -> String {
        if self.is_not_found() {
            self.to_string()
        } else {
            format!("{EXPORT_FAILED_NOTICE}\n{self}")
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
