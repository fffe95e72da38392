use super::Packer;
use crate::config::PackerConfig;
use crate::model::{InputRect, Page, Placement, Rect, RectHandle};
use crate::progress::ProgressListener;
use crate::search::{PageSize, smallest_page_size};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Places every rect in a uniform cell sized to the largest input plus padding.
///
/// Cells fill each page left to right, top to bottom; rects that do not fit roll over to the
/// next page in their original order.
#[derive(Debug, Clone)]
pub struct GridPacker {
    config: PackerConfig,
}

/// Page bounds available to cells once edge padding is reserved.
///
/// With `edge_padding` the bounds shrink by one padding unit when `duplicate_padding` is set and
/// by two otherwise. This mirrors long-standing atlas output and is not derived from the grid
/// geometry, so keep any correction here.
pub fn edge_padded_max(cfg: &PackerConfig) -> (u32, u32) {
    if !cfg.edge_padding {
        return (cfg.max_width, cfg.max_height);
    }
    let units = if cfg.duplicate_padding { 1 } else { 2 };
    (
        cfg.max_width.saturating_sub(cfg.padding_x.saturating_mul(units)),
        cfg.max_height.saturating_sub(cfg.padding_y.saturating_mul(units)),
    )
}

impl GridPacker {
    pub fn new(config: PackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Cell size shared by every rect: largest input plus padding.
    pub fn cell_size<K>(&self, rects: &[InputRect<K>]) -> (u32, u32) {
        let (w, h) = rects
            .iter()
            .fold((0u32, 0u32), |(w, h), r| (w.max(r.w), h.max(r.h)));
        (
            w.saturating_add(self.config.padding_x),
            h.saturating_add(self.config.padding_y),
        )
    }

    /// Smallest page (within the config bounds) holding all `rects` on a single grid page.
    pub fn smallest_page_size<K: Clone>(
        &self,
        rects: &[InputRect<K>],
        progress: Option<&mut ProgressListener<'_>>,
    ) -> Option<PageSize> {
        if rects.is_empty() {
            return None;
        }
        let cell = self.cell_size(rects);
        smallest_page_size(
            &self.config,
            |w, h| {
                let mut cfg = self.config.clone();
                cfg.max_width = w;
                cfg.max_height = h;
                let handles: Vec<RectHandle> = (0..rects.len()).map(RectHandle).collect();
                let page = GridPacker::new(cfg).pack_page(0, rects, &handles, cell);
                page.placements.len() == rects.len() && within_bounds(&page, w, h, &self.config)
            },
            progress,
        )
    }

    /// Packs one page from `remaining`, in order, and finalizes it.
    fn pack_page<K: Clone>(
        &self,
        id: usize,
        rects: &[InputRect<K>],
        remaining: &[RectHandle],
        (cell_w, cell_h): (u32, u32),
    ) -> Page<K> {
        let (max_w, max_h) = edge_padded_max(&self.config);
        let (pad_x, pad_y) = (self.config.padding_x, self.config.padding_y);
        let mut page = Page::new(id);
        let (mut x, mut y) = (0u32, 0u32);

        for &handle in remaining {
            // The first cell of a row (and of a page) is always taken so oversized cells still
            // make progress.
            if x > 0 && x.saturating_add(cell_w) > max_w {
                y = y.saturating_add(cell_h);
                x = 0;
                if y.saturating_add(cell_h) > max_h {
                    break;
                }
            }
            let req = &rects[handle.0];
            page.placements.push(Placement {
                handle,
                key: req.key.clone(),
                frame: Rect::new(x, y, req.w.saturating_add(pad_x), req.h.saturating_add(pad_y)),
                source_size: req.source_size,
                rotated: false,
            });
            x = x.saturating_add(cell_w);
            page.width = page.width.max(x);
            page.height = page.height.max(y.saturating_add(cell_h));
        }

        // Rows grew downward from y = 0; flip so the origin is top-left for consumers.
        for p in &mut page.placements {
            p.frame.y = page.height.saturating_sub(p.frame.y).saturating_sub(p.frame.h);
        }
        page.width = page.width.saturating_sub(pad_x);
        page.height = page.height.saturating_sub(pad_y);
        page
    }
}

/// True when a grid page respects the unpadded bounds `w x h`.
fn within_bounds<K>(page: &Page<K>, w: u32, h: u32, cfg: &PackerConfig) -> bool {
    let (max_w, max_h) = edge_padded_max(&PackerConfig {
        max_width: w,
        max_height: h,
        ..cfg.clone()
    });
    page.width <= max_w && page.height <= max_h
}

impl<K: Clone> Packer<K> for GridPacker {
    fn pack(
        &self,
        rects: &[InputRect<K>],
        mut progress: Option<&mut ProgressListener<'_>>,
    ) -> Vec<Page<K>> {
        let total = rects.len();
        let cell = self.cell_size(rects);
        let (max_w, max_h) = edge_padded_max(&self.config);
        if total > 0 && (cell.0 > max_w || cell.1 > max_h) {
            warn!(
                cell_w = cell.0,
                cell_h = cell.1,
                max_w,
                max_h,
                "grid cell exceeds page bounds; oversized rects will overflow their page"
            );
        }

        let mut remaining: Vec<RectHandle> = (0..total).map(RectHandle).collect();
        let mut pages: Vec<Page<K>> = Vec::new();

        while !remaining.is_empty() {
            if let Some(p) = progress.as_deref_mut() {
                let count = total - remaining.len() + 1;
                if p.update_count(count, total) {
                    debug!(pages = pages.len(), "grid packing canceled");
                    break;
                }
            }

            let page = self.pack_page(pages.len(), rects, &remaining, cell);
            let placed: HashSet<RectHandle> = page.placements.iter().map(|p| p.handle).collect();
            remaining.retain(|h| !placed.contains(h));
            debug!(
                id = page.id,
                placed = placed.len(),
                width = page.width,
                height = page.height,
                "grid page packed"
            );
            pages.push(page);
        }
        pages
    }
}
