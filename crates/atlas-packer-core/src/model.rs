use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w.saturating_sub(1))
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h.saturating_sub(1))
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the interiors of `self` and `r` intersect.
    pub fn overlaps(&self, r: &Rect) -> bool {
        self.x < r.x.saturating_add(r.w)
            && r.x < self.x.saturating_add(self.w)
            && self.y < r.y.saturating_add(r.h)
            && r.y < self.y.saturating_add(self.h)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Stable identity of an input rect: its position in the slice handed to a packer.
///
/// Equal-sized inputs stay distinct because their handles differ, so "placed" and
/// "remaining" sets are tracked by handle rather than by value.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct RectHandle(pub usize);

impl RectHandle {
    /// Ordinal used to break ties between otherwise identical rects.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An unplaced rect to pack. Packers never mutate requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputRect<K = String> {
    /// User-specified key (e.g., filename or asset path).
    pub key: K,
    /// Width to pack, before padding.
    pub w: u32,
    /// Height to pack, before padding.
    pub h: u32,
    /// Original source size.
    pub source_size: (u32, u32),
}

impl<K> InputRect<K> {
    pub fn new(key: K, w: u32, h: u32) -> Self {
        Self {
            key,
            w,
            h,
            source_size: (w, h),
        }
    }

    pub fn with_source_size(mut self, w: u32, h: u32) -> Self {
        self.source_size = (w, h);
        self
    }
}

/// A rect placed on a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement<K = String> {
    /// Handle of the request this placement answers.
    pub handle: RectHandle,
    pub key: K,
    /// Placed rectangle in page coordinates (top-left origin), padding included.
    pub frame: Rect,
    /// Original source size, copied from the request.
    pub source_size: (u32, u32),
    /// Reserved for rotating packers; grid packing never rotates.
    pub rotated: bool,
}

/// A single atlas page (logical record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<K = String> {
    pub id: usize,
    /// Occupied width, net of trailing padding.
    pub width: u32,
    /// Occupied height, net of trailing padding.
    pub height: u32,
    /// Placements in placement order.
    pub placements: Vec<Placement<K>>,
}

impl<K> Page<K> {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            width: 0,
            height: 0,
            placements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Area of the placed sources (padding excluded).
    pub fn used_area(&self) -> u64 {
        self.placements
            .iter()
            .map(|p| p.source_size.0 as u64 * p.source_size.1 as u64)
            .sum()
    }

    /// Fraction of the page covered by placed sources (0.0 to 1.0, 0.0 for a zero-area page).
    pub fn occupancy(&self) -> f64 {
        let area = self.width as u64 * self.height as u64;
        if area == 0 {
            return 0.0;
        }
        (self.used_area() as f64 / area as f64).min(1.0)
    }
}

/// Handles of `inputs` that appear on none of `pages`.
///
/// Grid packing never reports failure, so this is how callers detect rects dropped by a
/// canceled pack.
pub fn unplaced<K, P>(inputs: &[InputRect<K>], pages: &[Page<P>]) -> Vec<RectHandle> {
    let mut placed = vec![false; inputs.len()];
    for page in pages {
        for p in &page.placements {
            if let Some(slot) = placed.get_mut(p.handle.0) {
                *slot = true;
            }
        }
    }
    placed
        .iter()
        .enumerate()
        .filter(|(_, placed)| !**placed)
        .map(|(i, _)| RectHandle(i))
        .collect()
}

/// Atlas-level metadata (common fields used by exporters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version for the JSON metadata formats; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub algorithm: String,
    pub max_dim: (u32, u32),
    pub padding: (u32, u32),
    pub edge_padding: bool,
    pub duplicate_padding: bool,
    pub power_of_two: bool,
    pub multiple_of_four: bool,
}

impl Meta {
    pub(crate) fn for_config(cfg: &crate::config::PackerConfig, algorithm: &str) -> Self {
        Self {
            schema_version: "1".into(),
            app: "atlas-packer".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            algorithm: algorithm.into(),
            max_dim: (cfg.max_width, cfg.max_height),
            padding: (cfg.padding_x, cfg.padding_y),
            edge_padding: cfg.edge_padding,
            duplicate_padding: cfg.duplicate_padding,
            power_of_two: cfg.power_of_two,
            multiple_of_four: cfg.multiple_of_four,
        }
    }
}

/// Atlas of pages and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas<K = String> {
    pub pages: Vec<Page<K>>,
    pub meta: Meta,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of pages in the atlas.
    pub num_pages: usize,
    /// Total number of placed rects.
    pub num_rects: usize,
    /// Total area of all pages (sum of width * height for each page).
    pub total_page_area: u64,
    /// Total source area of all placed rects.
    pub used_area: u64,
    /// Occupancy ratio: used_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
    pub avg_page_width: f64,
    pub avg_page_height: f64,
    pub max_page_width: u32,
    pub max_page_height: u32,
}

impl<K> Atlas<K> {
    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let num_pages = self.pages.len();
        let mut num_rects = 0;
        let mut total_page_area = 0u64;
        let mut used_area = 0u64;
        let mut max_page_width = 0u32;
        let mut max_page_height = 0u32;

        for page in &self.pages {
            total_page_area += page.width as u64 * page.height as u64;
            max_page_width = max_page_width.max(page.width);
            max_page_height = max_page_height.max(page.height);
            num_rects += page.placements.len();
            used_area += page.used_area();
        }

        let occupancy = if total_page_area > 0 {
            used_area as f64 / total_page_area as f64
        } else {
            0.0
        };

        let (avg_page_width, avg_page_height) = if num_pages > 0 {
            let total_width: u64 = self.pages.iter().map(|p| p.width as u64).sum();
            let total_height: u64 = self.pages.iter().map(|p| p.height as u64).sum();
            (
                total_width as f64 / num_pages as f64,
                total_height as f64 / num_pages as f64,
            )
        } else {
            (0.0, 0.0)
        };

        PackStats {
            num_pages,
            num_rects,
            total_page_area,
            used_area,
            occupancy,
            avg_page_width,
            avg_page_height,
            max_page_width,
            max_page_height,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Rects: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_pages,
            self.num_rects,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.total_page_area > 0 {
            (self.wasted_area() as f64 / self.total_page_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
