//! Core library for packing rectangles into texture atlas pages.
//!
//! - Algorithm: grid packing (one uniform cell per rect, sized to the largest input plus padding)
//! - Search: `BinarySearch` over page dimensions with power-of-two / multiple-of-4 modes
//! - Progress: nested weighted scopes with cooperative cancellation (`ProgressListener`)
//! - Pipeline: `pack_layout` takes (key, w, h) triples and returns pages + metadata
//!
//! The core works on geometry only: it never decodes images or writes files.
//!
//! Quick example:
//! ```
//! use atlas_packer_core::{PackerConfig, pack_layout};
//! # fn main() -> atlas_packer_core::Result<()> {
//! let cfg = PackerConfig::builder()
//!     .with_max_dimensions(25, 25)
//!     .padding(2)
//!     .build();
//! let inputs = (0..5).map(|i| (format!("r{i}"), 10, 10)).collect();
//! let atlas = pack_layout(inputs, cfg)?;
//! assert_eq!(atlas.pages.len(), 2);
//! assert_eq!(atlas.pages[0].placements.len(), 4);
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod progress;
pub mod search;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{PackerConfig, PackerConfigBuilder};
    pub use crate::model::{
        Atlas, InputRect, Meta, PackStats, Page, Placement, Rect, RectHandle, unplaced,
    };
    pub use crate::packer::Packer;
    pub use crate::packer::grid::{GridPacker, edge_padded_max};
    pub use crate::pipeline::{LayoutItem, pack_layout, pack_layout_items};
    pub use crate::progress::{CancelHandle, ProgressListener, ProgressSink};
    pub use crate::search::{BinarySearch, PageSize, smallest_page_size};
}
