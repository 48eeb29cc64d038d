//! Page rasterization: one [`Page`] in, one [`PageCapture`] out.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::capture::PageCapture;
use crate::error::Result;
use crate::images::{ImageLoader, ImageStore};
use crate::layout::{PinnedHeader, Typesetter};
use crate::pagination::Page;
use crate::surface::Surface;

/// Per-mode rasterization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSettings {
    /// Logical page width `W` in px.
    pub logical_width: f32,
    /// Page height `H` in px at `logical_width`.
    pub page_height: f32,
    /// Oversampling factor `S`.
    pub scale: u32,
    /// Total wait for one batch of images.
    pub image_timeout: Duration,
    /// Settle delay before each page is measured.
    pub page_settle: Duration,
    /// Settle delay before a document is split.
    pub document_settle: Duration,
}

/// Produces captures strictly one page at a time on a single surface.
pub struct Rasterizer<'a, L> {
    loader: &'a L,
    typesetter: Typesetter<'a>,
    settings: RasterSettings,
    surface: Surface,
    images: ImageStore,
}

impl<'a, L: ImageLoader> Rasterizer<'a, L> {
    pub fn new(loader: &'a L, typesetter: Typesetter<'a>, settings: RasterSettings) -> Self {
        Self {
            loader,
            typesetter,
            settings,
            surface: Surface::new(settings.logical_width),
            images: ImageStore::new(),
        }
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn content_width(&self) -> f32 {
        self.surface.content_width()
    }

    /// Wait for `srcs` to load (bounded by the image timeout) so that their
    /// intrinsic sizes are known before anything is measured.
    pub async fn prepare(&mut self, srcs: &[String]) {
        self.images
            .load_all(self.loader, srcs, self.settings.image_timeout)
            .await;
    }

    /// Let a freshly built document settle before it is split.
    pub async fn settle_document(&self) {
        settle(self.settings.document_settle).await;
    }

    /// Height of the pinned header at the content width.
    pub fn header_height(&self, header: &PinnedHeader) -> f32 {
        let intrinsic = header
            .image
            .as_deref()
            .and_then(|src| self.images.dimensions(src));
        self.typesetter
            .header_height(header, self.content_width(), intrinsic)
    }

    /// Rasterize one page. The surface is released before this returns,
    /// whatever the outcome.
    pub async fn rasterize(&mut self, page: &Page) -> Result<PageCapture> {
        self.prepare(&page.image_sources()).await;
        settle(self.settings.page_settle).await;

        let scale = self.settings.scale.max(1);
        let layout = {
            let mut attached = self.surface.attach(page);
            attached.layout(&self.typesetter, &self.images, self.settings.page_height)?
        };

        let mut images = BTreeMap::new();
        for b in &layout.boxes {
            let mut found = Vec::new();
            b.visit(&mut |lb| {
                if let Some(img) = &lb.image {
                    found.push(img);
                }
            });
            for img in found {
                if images.contains_key(&img.src) {
                    continue;
                }
                if let Some(raster) = self.images.oversample(&img.src, img.width, img.height, scale)? {
                    images.insert(img.src.clone(), raster);
                }
            }
        }

        let width_px = (self.settings.logical_width * scale as f32).round() as u32;
        let height_px = (layout.height * scale as f32).ceil() as u32;
        log::debug!("page captured at {width_px}×{height_px} px");

        Ok(PageCapture {
            width_px,
            height_px,
            scale,
            boxes: layout.boxes,
            images,
        })
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
