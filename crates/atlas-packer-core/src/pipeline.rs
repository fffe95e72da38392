use crate::config::PackerConfig;
use crate::error::Result;
use crate::model::{Atlas, InputRect, Meta, Page};
use crate::packer::{Packer, grid::GridPacker};
use crate::progress::ProgressListener;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Layout item with an optional original size, for inputs that were trimmed or scaled upstream.
#[derive(Debug, Clone)]
pub struct LayoutItem<K = String> {
    pub key: K,
    pub w: u32,
    pub h: u32,
    pub source_size: Option<(u32, u32)>,
}

impl<K> LayoutItem<K> {
    pub fn new(key: K, w: u32, h: u32) -> Self {
        Self {
            key,
            w,
            h,
            source_size: None,
        }
    }
}

/// Packs sizes into grid pages. Inputs are (key, width, height).
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: PackerConfig,
) -> Result<Atlas<String>> {
    let items = inputs
        .into_iter()
        .map(|(k, w, h)| LayoutItem::new(k, w, h))
        .collect();
    pack_layout_items(items, cfg, None)
}

/// Packs layout items into grid pages and wraps them into an [`Atlas`].
///
/// Notes:
/// - The configuration is validated first; packing itself never fails.
/// - Input order is preserved: earlier items take earlier cells and pages.
/// - With `shrink_to_fit`, inputs that fit on one page are packed at the smallest page size
///   the search finds. The search takes the first half of `progress`, packing the second.
/// - A canceled `progress` yields the pages finished so far; see [`crate::model::unplaced`].
#[instrument(skip_all, fields(items = items.len()))]
pub fn pack_layout_items<K: Into<String>>(
    items: Vec<LayoutItem<K>>,
    cfg: PackerConfig,
    mut progress: Option<&mut ProgressListener<'_>>,
) -> Result<Atlas<String>> {
    cfg.validate()?;

    let rects: Vec<InputRect<String>> = items
        .into_iter()
        .map(|it| {
            let (w, h) = (it.w, it.h);
            let rect = InputRect::new(it.key.into(), w, h);
            match it.source_size {
                Some((sw, sh)) => rect.with_source_size(sw, sh),
                None => rect,
            }
        })
        .collect();

    let mut packer = GridPacker::new(cfg.clone());
    let shrink = cfg.shrink_to_fit && !rects.is_empty();
    if shrink {
        let size = match progress.as_deref_mut() {
            Some(p) => p.scoped(0.5, |p| packer.smallest_page_size(&rects, Some(p))),
            None => packer.smallest_page_size(&rects, None),
        };
        if let Some(size) = size {
            debug!(width = size.width, height = size.height, "shrinking page bounds");
            packer = GridPacker::new(PackerConfig {
                max_width: size.width,
                max_height: size.height,
                ..cfg.clone()
            });
        }
    }

    let pages = match progress {
        Some(p) if shrink => {
            p.set_message("packing");
            p.scoped(0.5, |p| packer.pack(&rects, Some(p)))
        }
        Some(p) => {
            p.set_message("packing");
            packer.pack(&rects, Some(p))
        }
        None => packer.pack(&rects, None),
    };

    let atlas = Atlas {
        pages,
        meta: Meta::for_config(&cfg, "grid"),
    };
    info!(pages = atlas.pages.len(), "layout packed");
    Ok(atlas)
}

/// Packs independent batches into one atlas each. With the `parallel` feature the batches are
/// packed on the rayon pool, one packer per batch.
pub fn pack_layout_batches<K: Into<String> + Send>(
    batches: Vec<Vec<LayoutItem<K>>>,
    cfg: &PackerConfig,
) -> Result<Vec<Atlas<String>>> {
    #[cfg(feature = "parallel")]
    {
        batches
            .into_par_iter()
            .map(|items| pack_layout_items(items, cfg.clone(), None))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        batches
            .into_iter()
            .map(|items| pack_layout_items(items, cfg.clone(), None))
            .collect()
    }
}

/// Total page area of `pages`, the tie-breaker when comparing layouts with equal page counts.
pub fn total_page_area<K>(pages: &[Page<K>]) -> u64 {
    pages
        .iter()
        .map(|p| p.width as u64 * p.height as u64)
        .sum()
}
