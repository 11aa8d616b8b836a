//! Class discovery and deterministic split bookkeeping.

mod catalog;
mod class;
mod handle;

use std::path::PathBuf;

use thiserror::Error;

pub use catalog::{CatalogSummary, ClassSummary, DatasetCatalog};
pub use class::ClassDataset;
pub use handle::{HandleRegistry, ImageHandle};

/// Errors raised while building class datasets or the catalog.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A class (or root) directory does not exist.
    #[error("image directory not found: {path}")]
    MissingDirectory { path: PathBuf },
    /// A class has fewer images than the configured minimum.
    #[error("class '{label}' has {count} images; at least {min} required")]
    ClassTooSmall {
        label: String,
        count: usize,
        min: usize,
    },
    /// A class has more images than the configured maximum.
    #[error("class '{label}' has {count} images; at most {max} allowed")]
    ClassTooLarge {
        label: String,
        count: usize,
        max: u64,
    },
    /// The supplied configuration failed validation.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    /// Directory enumeration failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
