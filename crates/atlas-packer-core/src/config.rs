use serde::{Deserialize, Serialize};

/// Packing configuration consumed by the grid packer and the page-size search.
/// Key notes:
///   - `max_width`/`max_height` bound every page; `edge_padding` and `duplicate_padding`
///     shrink those bounds (see `packer::grid::edge_padded_max`)
///   - `min_width`/`min_height`, `power_of_two`, `multiple_of_four` and `fuzziness` only
///     affect the page-size search (`shrink_to_fit`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackerConfig {
    /// Maximum page width in pixels.
    pub max_width: u32,
    /// Maximum page height in pixels.
    pub max_height: u32,
    /// Smallest page width the size search will propose.
    #[serde(default = "default_min_dim")]
    pub min_width: u32,
    /// Smallest page height the size search will propose.
    #[serde(default = "default_min_dim")]
    pub min_height: u32,

    /// Pixels added to the right of every placed rect.
    pub padding_x: u32,
    /// Pixels added below every placed rect.
    pub padding_y: u32,
    /// Reserve padding along the outer page boundary.
    #[serde(default)]
    pub edge_padding: bool,
    /// Padding is shared between neighbours, so the edge only needs one unit.
    #[serde(default)]
    pub duplicate_padding: bool,

    /// Searched page dimensions must be powers of two.
    #[serde(default)]
    pub power_of_two: bool,
    /// Searched page dimensions must be multiples of 4 (ignored with `power_of_two`).
    #[serde(default)]
    pub multiple_of_four: bool,
    /// Early-stop tolerance of the size search, in pixels.
    #[serde(default)]
    pub fuzziness: u32,
    /// Search for the smallest single page before packing.
    #[serde(default)]
    pub shrink_to_fit: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            min_width: default_min_dim(),
            min_height: default_min_dim(),
            padding_x: 2,
            padding_y: 2,
            edge_padding: false,
            duplicate_padding: false,
            power_of_two: false,
            multiple_of_four: false,
            fuzziness: 0,
            shrink_to_fit: false,
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Maximum dimensions are zero
    /// - With `shrink_to_fit`, minimum dimensions exceed the maximum ones
    /// - Edge padding would leave no usable space
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasPackerError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(AtlasPackerError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        // The minimums only bound the size search.
        if self.shrink_to_fit
            && (self.min_width > self.max_width || self.min_height > self.max_height)
        {
            return Err(AtlasPackerError::InvalidConfig(format!(
                "min dimensions ({}x{}) exceed max dimensions ({}x{})",
                self.min_width, self.min_height, self.max_width, self.max_height
            )));
        }

        let (usable_width, usable_height) = crate::packer::grid::edge_padded_max(self);
        if usable_width == 0 || usable_height == 0 {
            return Err(AtlasPackerError::InvalidConfig(format!(
                "No usable space after edge padding: {}x{} with padding {}x{}",
                self.max_width, self.max_height, self.padding_x, self.padding_y
            )));
        }

        Ok(())
    }
}

fn default_min_dim() -> u32 {
    16
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn with_min_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.min_width = w;
        self.cfg.min_height = h;
        self
    }
    /// Sets both paddings at once.
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding_x = v;
        self.cfg.padding_y = v;
        self
    }
    pub fn padding_x(mut self, v: u32) -> Self {
        self.cfg.padding_x = v;
        self
    }
    pub fn padding_y(mut self, v: u32) -> Self {
        self.cfg.padding_y = v;
        self
    }
    pub fn edge_padding(mut self, v: bool) -> Self {
        self.cfg.edge_padding = v;
        self
    }
    pub fn duplicate_padding(mut self, v: bool) -> Self {
        self.cfg.duplicate_padding = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn mod4(mut self, v: bool) -> Self {
        self.cfg.multiple_of_four = v;
        self
    }
    pub fn fuzziness(mut self, v: u32) -> Self {
        self.cfg.fuzziness = v;
        self
    }
    pub fn shrink_to_fit(mut self, v: bool) -> Self {
        self.cfg.shrink_to_fit = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}

impl PackerConfig {
    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}
