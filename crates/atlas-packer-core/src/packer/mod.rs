use crate::model::{InputRect, Page};
use crate::progress::ProgressListener;

pub mod grid;

/// A packer distributes rects over as many pages as it needs.
///
/// Implementations must not mutate `rects`; each returned placement refers back to its request
/// through `RectHandle`, the request's index in `rects`. Packers may stop early when `progress`
/// reports cancellation, returning only fully packed pages.
pub trait Packer<K> {
    fn pack(
        &self,
        rects: &[InputRect<K>],
        progress: Option<&mut ProgressListener<'_>>,
    ) -> Vec<Page<K>>;
}
