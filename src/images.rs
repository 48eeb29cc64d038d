//! Image sources for page captures.
//!
//! Loading is best effort: a source that fails to load, fails to decode or
//! does not answer within the timeout is recorded as broken and rasterizes
//! empty. One broken image never blocks an export.

use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::{imageops::FilterType, DynamicImage, ImageFormat};

use crate::capture::RasterImage;
use crate::error::{ExportError, Result};

/// Fetches raw image bytes for a source string.
pub trait ImageLoader {
    fn load(&self, src: &str) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Loads `data:` URIs and files relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    base_dir: PathBuf,
}

impl FileImageLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ImageLoader for FileImageLoader {
    async fn load(&self, src: &str) -> Result<Vec<u8>> {
        if src.starts_with("data:") {
            return parse_data_uri(src);
        }
        if src.contains("://") {
            return Err(ExportError::Image(format!(
                "unsupported image source scheme: {src}"
            )));
        }
        Ok(tokio::fs::read(self.base_dir.join(src)).await?)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub fn parse_data_uri(src: &str) -> Result<Vec<u8>> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(80).collect();
        ExportError::Image(format!("not a data URI: {preview:?}"))
    })?;
    let comma_pos = rest.find(',').ok_or_else(|| {
        ExportError::Image("invalid data URI: missing `,` separator".to_string())
    })?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err(ExportError::Image(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| ExportError::Image(format!("base64 decode error: {e}")))
}

enum ImageState {
    Ready(DynamicImage),
    Broken,
}

/// Decoded images, cached across the pages of one export.
#[derive(Default)]
pub struct ImageStore {
    images: HashMap<String, ImageState>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every source not seen yet. The whole batch shares one `timeout`;
    /// whatever has not resolved by then is marked broken.
    pub async fn load_all<L: ImageLoader>(&mut self, loader: &L, srcs: &[String], timeout: Duration) {
        let mut pending: Vec<String> = Vec::new();
        for src in srcs {
            if !self.images.contains_key(src) && !pending.contains(src) {
                pending.push(src.clone());
            }
        }
        if pending.is_empty() {
            return;
        }

        let images = &mut self.images;
        let batch = async {
            for src in &pending {
                let state = match loader.load(src).await {
                    Ok(bytes) => match image::load_from_memory(&bytes) {
                        Ok(img) => ImageState::Ready(img),
                        Err(e) => {
                            log::warn!("image '{}' could not be decoded: {e}", preview(src));
                            ImageState::Broken
                        }
                    },
                    Err(e) => {
                        log::warn!("image '{}' could not be loaded: {e}", preview(src));
                        ImageState::Broken
                    }
                };
                images.insert(src.clone(), state);
            }
        };
        if tokio::time::timeout(timeout, batch).await.is_err() {
            log::warn!(
                "image loading timed out after {} ms; continuing without the remaining images",
                timeout.as_millis()
            );
        }

        for src in pending {
            self.images.entry(src).or_insert(ImageState::Broken);
        }
    }

    /// Intrinsic pixel size of a loaded image.
    pub fn dimensions(&self, src: &str) -> Option<(u32, u32)> {
        match self.images.get(src) {
            Some(ImageState::Ready(img)) => Some((img.width(), img.height())),
            _ => None,
        }
    }

    /// True when `src` was attempted and failed or timed out.
    pub fn is_broken(&self, src: &str) -> bool {
        matches!(self.images.get(src), Some(ImageState::Broken))
    }

    /// Resample a loaded image to `width × height` logical px at `scale`
    /// device pixels per logical pixel, encoded as PNG. `None` for broken or
    /// unknown sources.
    pub fn oversample(
        &self,
        src: &str,
        width: f32,
        height: f32,
        scale: u32,
    ) -> Result<Option<RasterImage>> {
        let Some(ImageState::Ready(img)) = self.images.get(src) else {
            return Ok(None);
        };
        let px_width = ((width * scale as f32).round() as u32).max(1);
        let px_height = ((height * scale as f32).round() as u32).max(1);
        let resized = img.resize_exact(px_width, px_height, FilterType::Triangle);

        let mut png = Vec::new();
        resized
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExportError::Image(format!("PNG encode error: {e}")))?;
        Ok(Some(RasterImage {
            px_width,
            px_height,
            png,
        }))
    }
}

fn preview(src: &str) -> String {
    src.chars().take(60).collect()
}
