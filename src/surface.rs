//! The off-screen page surface.
//!
//! One [`Surface`] exists per export. A page is laid out on it by acquiring an
//! [`AttachedPage`] guard; the guard borrows the surface mutably, so only one
//! page can be attached at a time, and dropping it clears the flexbox tree
//! whether the page succeeded or not.

use taffy::prelude::{
    AvailableSpace, Dimension, LengthPercentage, LengthPercentageAuto, NodeId, Rect, Size, Style,
    TaffyTree,
};

use crate::capture::LayoutBox;
use crate::error::{ExportError, Result};
use crate::images::ImageStore;
use crate::layout::{Typeset, Typesetter, HEADER_GAP, META_MARGIN, TITLE_ROW_MARGIN};
use crate::pagination::{Page, BLOCK_MARGIN_PX, PAGE_PADDING_PX};

/// Padding on each side of a page surface.
pub const SURFACE_PADDING_PX: f32 = PAGE_PADDING_PX / 2.0;

/// Result of laying out one page.
#[derive(Debug, Clone)]
pub struct SurfaceLayout {
    pub boxes: Vec<LayoutBox>,
    /// Rendered height of the whole page surface, padding included.
    pub height: f32,
}

pub struct Surface {
    tree: TaffyTree<()>,
    width: f32,
    attached: bool,
}

impl Surface {
    /// A surface of the given logical width.
    pub fn new(width: f32) -> Self {
        let mut tree = TaffyTree::new();
        tree.disable_rounding();
        Self {
            tree,
            width,
            attached: false,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Width available to page content.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * SURFACE_PADDING_PX
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attach `page` to the surface until the returned guard is dropped.
    pub fn attach<'s>(&'s mut self, page: &'s Page) -> AttachedPage<'s> {
        self.attached = true;
        log::debug!(
            "surface attached ({} items, header: {})",
            page.items.len(),
            page.header.is_some()
        );
        AttachedPage {
            surface: self,
            page,
        }
    }
}

/// A page currently occupying the surface.
pub struct AttachedPage<'s> {
    surface: &'s mut Surface,
    page: &'s Page,
}

struct Placed {
    node: NodeId,
    /// Parent row for header children, whose positions are row-relative.
    parent: Option<NodeId>,
    typeset: Typeset,
}

fn length(v: f32) -> Dimension {
    Dimension::Length(v)
}

fn leaf_style(width: f32, height: f32, margin_bottom: f32) -> Style {
    Style {
        size: Size {
            width: length(width),
            height: length(height),
        },
        flex_shrink: 0.0,
        margin: Rect {
            top: LengthPercentageAuto::Length(0.0),
            right: LengthPercentageAuto::Length(0.0),
            bottom: LengthPercentageAuto::Length(margin_bottom),
            left: LengthPercentageAuto::Length(0.0),
        },
        ..Default::default()
    }
}

impl AttachedPage<'_> {
    /// Lay the attached page out, returning boxes in page coordinates.
    pub fn layout(
        &mut self,
        typesetter: &Typesetter<'_>,
        images: &ImageStore,
        page_height: f32,
    ) -> Result<SurfaceLayout> {
        let width = self.surface.width;
        let content_width = self.surface.content_width();
        if content_width <= 0.0 {
            return Err(ExportError::layout(format!(
                "surface width {width} px leaves no room for content"
            )));
        }
        let tree = &mut self.surface.tree;
        let page = self.page;
        let mut placed: Vec<Placed> = Vec::new();
        let mut children: Vec<NodeId> = Vec::new();

        if let Some(header) = &page.header {
            let (img_w, img_h) = match &header.image {
                Some(src) => typesetter.side_image_size(images.dimensions(src), content_width),
                None => (0.0, 0.0),
            };
            let title_w = typesetter.title_width(header, content_width, img_w);
            let title = typesetter.title(&header.title, title_w);
            let title_node = tree
                .new_leaf(leaf_style(title_w, title.height, 0.0))
                .map_err(ExportError::layout)?;

            let mut row_children = vec![title_node];
            let mut row_placed = vec![(title_node, title)];
            if let Some(src) = &header.image {
                let node = tree
                    .new_leaf(leaf_style(img_w, img_h, 0.0))
                    .map_err(ExportError::layout)?;
                row_children.push(node);
                row_placed.push((
                    node,
                    Typeset {
                        height: img_h,
                        boxes: vec![typesetter.image_box(src, (img_w, img_h))],
                    },
                ));
            }

            let row = tree
                .new_with_children(
                    Style {
                        display: taffy::Display::Flex,
                        flex_direction: taffy::FlexDirection::Row,
                        align_items: Some(taffy::AlignItems::FlexStart),
                        flex_shrink: 0.0,
                        gap: Size {
                            width: LengthPercentage::Length(HEADER_GAP),
                            height: LengthPercentage::Length(0.0),
                        },
                        margin: Rect {
                            top: LengthPercentageAuto::Length(0.0),
                            right: LengthPercentageAuto::Length(0.0),
                            bottom: LengthPercentageAuto::Length(TITLE_ROW_MARGIN),
                            left: LengthPercentageAuto::Length(0.0),
                        },
                        ..Default::default()
                    },
                    &row_children,
                )
                .map_err(ExportError::layout)?;
            children.push(row);
            placed.extend(row_placed.into_iter().map(|(node, typeset)| Placed {
                node,
                parent: Some(row),
                typeset,
            }));

            for line in &header.meta {
                let meta = typesetter.meta(line, content_width);
                let node = tree
                    .new_leaf(leaf_style(content_width, meta.height, META_MARGIN))
                    .map_err(ExportError::layout)?;
                children.push(node);
                placed.push(Placed {
                    node,
                    parent: None,
                    typeset: meta,
                });
            }
        }

        for item in &page.items {
            let typeset = typesetter.typeset(item, content_width);
            let node = tree
                .new_leaf(leaf_style(content_width, typeset.height, BLOCK_MARGIN_PX))
                .map_err(ExportError::layout)?;
            children.push(node);
            placed.push(Placed {
                node,
                parent: None,
                typeset,
            });
        }

        let padding = LengthPercentage::Length(SURFACE_PADDING_PX);
        let mut root_style = Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Column,
            size: Size {
                width: length(width),
                height: Dimension::Auto,
            },
            padding: Rect {
                top: padding,
                right: padding,
                bottom: padding,
                left: padding,
            },
            ..Default::default()
        };
        if page.centered {
            root_style.min_size.height = length(page_height);
            root_style.justify_content = Some(taffy::JustifyContent::Center);
        }
        let root = tree
            .new_with_children(root_style, &children)
            .map_err(ExportError::layout)?;
        tree.compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(ExportError::layout)?;

        let mut boxes = Vec::new();
        for Placed {
            node,
            parent,
            typeset,
        } in placed
        {
            let mut x = 0.0;
            let mut y = 0.0;
            for id in parent.into_iter().chain(std::iter::once(node)) {
                let l = tree.layout(id).map_err(ExportError::layout)?;
                x += l.location.x;
                y += l.location.y;
            }
            for mut b in typeset.boxes {
                b.translate(x, y);
                boxes.push(b);
            }
        }
        let height = tree.layout(root).map_err(ExportError::layout)?.size.height;

        Ok(SurfaceLayout { boxes, height })
    }
}

impl Drop for AttachedPage<'_> {
    fn drop(&mut self) {
        self.surface.tree.clear();
        self.surface.attached = false;
        log::debug!("surface detached");
    }
}
