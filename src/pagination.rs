//! Pagination – splits a measured flow into pages.
//!
//! The splitter never breaks an item internally. It uses a soft threshold:
//! a page is closed only when less than 15 % of the page height remains and
//! the next item does not fit in what is left. Elsewhere an item may overflow
//! the page bottom slightly rather than leave a large gap.

use crate::layout::{FlowItem, PinnedHeader};

/// Running height a fresh page starts with (top + bottom padding).
pub const PAGE_PADDING_PX: f32 = 40.0;
/// Vertical margin added after every item.
pub const BLOCK_MARGIN_PX: f32 = 10.0;
/// Fraction of the page height below which a break is considered.
pub const BREAK_THRESHOLD: f32 = 0.15;

/// Geometry the splitter works with, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitParams {
    pub page_height: f32,
    pub top_padding: f32,
    pub block_margin: f32,
}

impl SplitParams {
    pub fn new(page_height: f32) -> Self {
        Self {
            page_height,
            top_padding: PAGE_PADDING_PX,
            block_margin: BLOCK_MARGIN_PX,
        }
    }
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Present on the first page of a document only.
    pub header: Option<PinnedHeader>,
    pub items: Vec<FlowItem>,
    /// Content is centered vertically on a full-height page.
    pub centered: bool,
}

impl Page {
    /// A single full-page centered composition (title and chapter pages).
    pub fn centered(items: Vec<FlowItem>) -> Self {
        Self {
            header: None,
            items,
            centered: true,
        }
    }

    /// Image sources the page needs loaded before it can be measured.
    pub fn image_sources(&self) -> Vec<String> {
        self.header
            .as_ref()
            .and_then(|h| h.image.clone())
            .into_iter()
            .collect()
    }
}

/// Partition `(item, height)` pairs into pages, preserving order.
///
/// `header_height` is the pinned header's height on page 1 (`None` when the
/// document has no header). Always returns at least one page.
pub fn paginate<T>(
    header_height: Option<f32>,
    items: Vec<(T, f32)>,
    params: &SplitParams,
) -> Vec<Vec<T>> {
    let h = params.page_height;
    let threshold = h * BREAK_THRESHOLD;

    let mut pages: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut running = params.top_padding + header_height.unwrap_or(0.0);
    let mut holds_header = header_height.is_some();

    for (item, height) in items {
        let remaining = h - running;
        let occupied = holds_header || !current.is_empty();
        if remaining < threshold && height > remaining && occupied {
            pages.push(std::mem::take(&mut current));
            running = params.top_padding;
            holds_header = false;
        }
        current.push(item);
        running += height + params.block_margin;
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// Split a document with an optional pinned header into [`Page`]s. The header
/// goes to the first page only.
pub fn paginate_document(
    header: Option<PinnedHeader>,
    header_height: f32,
    items: Vec<(FlowItem, f32)>,
    params: &SplitParams,
) -> Vec<Page> {
    let header_height = header.as_ref().map(|_| header_height);
    let mut header = header;
    paginate(header_height, items, params)
        .into_iter()
        .map(|items| Page {
            header: header.take(),
            items,
            centered: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 1000.0;

    fn params() -> SplitParams {
        SplitParams::new(H)
    }

    fn numbered(heights: &[f32]) -> Vec<(usize, f32)> {
        heights.iter().copied().enumerate().collect()
    }

    #[test]
    fn small_flow_fits_one_page() {
        let pages = paginate(Some(100.0), numbered(&[50.0; 10]), &params());
        assert_eq!(pages, vec![(0..10).collect::<Vec<_>>()]);
    }

    #[test]
    fn total_below_budget_is_single_page() {
        // Sum below H − P, margins included, always fits.
        let heights = [200.0, 150.0, 300.0, 100.0];
        let pages = paginate(None, numbered(&heights), &params());
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn break_only_near_the_bottom() {
        // After five 160 px items: 40 + 5 × 170 = 890 → remaining 110 < 150.
        let pages = paginate(None, numbered(&[160.0; 6]), &params());
        assert_eq!(pages, vec![vec![0, 1, 2, 3, 4], vec![5]]);
    }

    #[test]
    fn small_item_near_bottom_stays() {
        // remaining 110 < 150 but the item (100) fits.
        let pages = paginate(None, numbered(&[160.0, 160.0, 160.0, 160.0, 160.0, 100.0]), &params());
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn overflow_above_threshold_is_tolerated() {
        // remaining 360 ≥ 150, so the 500 px item overflows rather than breaks.
        let pages = paginate(None, numbered(&[590.0, 500.0]), &params());
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn oversized_item_gets_its_own_page() {
        let pages = paginate(None, numbered(&[900.0, 3000.0, 10.0]), &params());
        assert_eq!(pages, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn header_reduces_first_page_capacity() {
        let heights = [160.0; 5];
        assert_eq!(paginate(None, numbered(&heights), &params()).len(), 1);
        assert_eq!(paginate(Some(200.0), numbered(&heights), &params()).len(), 2);
    }

    #[test]
    fn huge_header_with_no_room_breaks_before_first_item() {
        let pages = paginate(Some(950.0), numbered(&[100.0]), &params());
        assert_eq!(pages, vec![vec![], vec![0]]);
    }

    #[test]
    fn empty_flow_yields_one_page() {
        let pages: Vec<Vec<usize>> = paginate(Some(80.0), Vec::new(), &params());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn every_item_lands_on_exactly_one_page_in_order() {
        let heights: Vec<f32> = (0..200).map(|i| ((i * 37) % 230) as f32 + 5.0).collect();
        let pages = paginate(Some(120.0), numbered(&heights), &params());
        let flat: Vec<usize> = pages.concat();
        assert_eq!(flat, (0..200).collect::<Vec<_>>());
        assert!(pages.len() > 1);
        assert!(pages.iter().skip(1).all(|p| !p.is_empty()));
    }

    #[test]
    fn header_stays_on_first_page() {
        let header = PinnedHeader {
            title: "T".into(),
            ..PinnedHeader::default()
        };
        let items: Vec<(FlowItem, f32)> = (0..30)
            .map(|_| (FlowItem::Rule, 100.0))
            .collect();
        let pages = paginate_document(Some(header.clone()), 60.0, items, &params());
        assert!(pages.len() > 1);
        assert_eq!(pages[0].header.as_ref(), Some(&header));
        assert!(pages[1..].iter().all(|p| p.header.is_none()));
        assert_eq!(pages.iter().map(|p| p.items.len()).sum::<usize>(), 30);
    }
}
