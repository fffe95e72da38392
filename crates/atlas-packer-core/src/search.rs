//! Integer binary search over page dimensions.
//!
//! [`BinarySearch`] knows nothing about rects: the caller proposes candidates from it, evaluates
//! them, and feeds the verdict back with [`BinarySearch::next`]. [`smallest_page_size`] drives two
//! searches (width, then height) with a caller-supplied "fits" predicate.

use crate::config::PackerConfig;
use crate::progress::ProgressListener;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Binary search state for one dimension.
///
/// `next(true)` moves the lower bound past the last candidate, `next(false)` moves the upper
/// bound below it. With a predicate that holds below some threshold, feeding it straight back
/// converges on the largest passing value; to find the smallest passing value feed back the
/// negation ("candidate too small").
///
/// The search does not remember which candidates passed. Callers keep their own last good
/// value: the final bracket may hold one value (or up to `fuzziness`) that was never proposed.
#[derive(Debug, Clone)]
pub struct BinarySearch {
    min: i64,
    max: i64,
    fuzziness: i64,
    low: i64,
    high: i64,
    current: i64,
    pot: bool,
    mod4: bool,
}

impl BinarySearch {
    /// `pot` searches exponents of two between `next_pow2(min)` and `next_pow2(max)` and ignores
    /// `fuzziness`. `mod4` (without `pot`) rounds the bounds and every candidate up to a
    /// multiple of 4.
    pub fn new(min: u32, max: u32, fuzziness: u32, pot: bool, mod4: bool) -> Self {
        let (min, max) = if pot {
            (log2_next_pow2(min), log2_next_pow2(max))
        } else if mod4 {
            (round_up4(min as i64), round_up4(max as i64))
        } else {
            (min as i64, max as i64)
        };
        Self {
            min,
            max,
            fuzziness: if pot { 0 } else { fuzziness as i64 },
            low: min,
            high: max,
            current: (min + max) >> 1,
            pot,
            mod4,
        }
    }

    /// Starts a search and returns the first candidate.
    pub fn reset(&mut self) -> u32 {
        self.low = self.min;
        self.high = self.max;
        self.current = (self.low + self.high) >> 1;
        self.candidate()
    }

    /// Consumes the verdict on the previous candidate and returns the next one, or `None`
    /// once the bracket is exhausted. Must follow [`BinarySearch::reset`].
    pub fn next(&mut self, result: bool) -> Option<u32> {
        if result {
            self.low = self.current + 1;
        } else {
            self.high = self.current - 1;
        }
        self.current = (self.low + self.high) >> 1;
        if self.is_done() {
            return None;
        }
        Some(self.candidate())
    }

    /// Exhausted once the bracket is empty; outside POT mode also once it is within
    /// `fuzziness` (a single unresolved value at fuzziness 0).
    fn is_done(&self) -> bool {
        self.low > self.high || (!self.pot && (self.high - self.low).abs() <= self.fuzziness)
    }

    fn candidate(&self) -> u32 {
        if self.pot {
            1u32 << self.current.clamp(0, 31)
        } else if self.mod4 {
            round_up4(self.current).clamp(0, u32::MAX as i64) as u32
        } else {
            self.current.clamp(0, u32::MAX as i64) as u32
        }
    }
}

fn round_up4(v: i64) -> i64 {
    if v % 4 == 0 { v } else { v + 4 - v % 4 }
}

fn log2_next_pow2(v: u32) -> i64 {
    v.checked_next_power_of_two()
        .map_or(31, |p| p.trailing_zeros()) as i64
}

/// Result of [`smallest_page_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Finds the smallest page that `fits` accepts, within the bounds of `cfg`.
///
/// The largest page the constraints allow (see [`constrained_limit`]) is checked first and
/// seeds the result; `None` means not even that page is accepted. Width is then searched with
/// the height held at that limit, and height at the chosen width. Each search keeps the
/// smallest accepted candidate, so results may sit one unit (or `fuzziness`) above the true
/// minimum. When the listener is canceled the best size found so far is returned.
pub fn smallest_page_size(
    cfg: &PackerConfig,
    mut fits: impl FnMut(u32, u32) -> bool,
    mut progress: Option<&mut ProgressListener<'_>>,
) -> Option<PageSize> {
    let limit_w = constrained_limit(cfg, cfg.max_width)?;
    let limit_h = constrained_limit(cfg, cfg.max_height)?;
    if !fits(limit_w, limit_h) {
        debug!(limit_w, limit_h, "largest allowed page does not fit");
        return None;
    }

    let min_w = cfg.min_width.min(cfg.max_width);
    let min_h = cfg.min_height.min(cfg.max_height);

    let mut width_search = BinarySearch::new(
        min_w,
        cfg.max_width,
        cfg.fuzziness,
        cfg.power_of_two,
        cfg.multiple_of_four,
    );
    let width = search_dimension(
        &mut width_search,
        "width",
        limit_w,
        progress.as_deref_mut(),
        |w| fits(w, limit_h),
    );

    let mut height_search = BinarySearch::new(
        min_h,
        cfg.max_height,
        cfg.fuzziness,
        cfg.power_of_two,
        cfg.multiple_of_four,
    );
    let height = search_dimension(&mut height_search, "height", limit_h, progress, |h| {
        fits(width, h)
    });

    debug!(width, height, "smallest page size");
    Some(PageSize { width, height })
}

/// Largest value not above `max` that the size constraints of `cfg` allow: the previous power
/// of two, the previous multiple of 4, or `max` itself. `None` when that is zero.
pub fn constrained_limit(cfg: &PackerConfig, max: u32) -> Option<u32> {
    let limit = if max == 0 {
        0
    } else if cfg.power_of_two {
        1 << (31 - max.leading_zeros())
    } else if cfg.multiple_of_four {
        max / 4 * 4
    } else {
        max
    };
    (limit > 0).then_some(limit)
}

/// Runs one search inside a half-width progress scope.
fn search_dimension(
    search: &mut BinarySearch,
    label: &str,
    limit: u32,
    progress: Option<&mut ProgressListener<'_>>,
    mut fits: impl FnMut(u32) -> bool,
) -> u32 {
    match progress {
        Some(p) => {
            p.set_message(format!("searching page {label}"));
            p.start(0.5);
            let best = run_search(search, label, limit, Some(&mut *p), &mut fits);
            p.end();
            best
        }
        None => run_search(search, label, limit, None, &mut fits),
    }
}

/// Returns the smallest accepted candidate, starting from `limit`, which the caller has
/// already found acceptable.
fn run_search(
    search: &mut BinarySearch,
    label: &str,
    limit: u32,
    mut progress: Option<&mut ProgressListener<'_>>,
    fits: &mut impl FnMut(u32) -> bool,
) -> u32 {
    // Each step halves the bracket.
    let steps = (64 - ((search.max - search.min).max(1) as u64).leading_zeros()) as usize + 1;
    let mut best = limit;
    let mut step = 0usize;
    let mut candidate = Some(search.reset());
    while let Some(value) = candidate {
        step += 1;
        if let Some(p) = progress.as_deref_mut() {
            if p.update_count(step.min(steps), steps) {
                break;
            }
        }
        // Rounded candidates can overshoot the limit; those count as too large.
        let ok = value == limit || (value < limit && fits(value));
        let too_small = value < limit && !ok;
        trace!(dimension = label, value, ok, "size candidate");
        if ok {
            best = best.min(value);
        }
        candidate = search.next(too_small);
    }
    best
}
