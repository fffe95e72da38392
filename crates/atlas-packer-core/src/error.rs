use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasPackerError {
    #[error("Invalid page dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AtlasPackerError>;
