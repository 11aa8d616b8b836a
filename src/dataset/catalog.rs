use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::PrepConfig;
use crate::partition::Split;

use super::{ClassDataset, DatasetError, HandleRegistry};

/// All class datasets discovered under one root directory.
///
/// The root contains one subdirectory per class label. Scanning walks the
/// subdirectories in sorted order and builds a [`ClassDataset`] for each; the
/// first class that fails validation aborts the scan. The catalog owns the
/// shared [`HandleRegistry`] and hands clones to every class.
#[derive(Debug)]
pub struct DatasetCatalog {
    root: PathBuf,
    classes: BTreeMap<String, ClassDataset>,
    registry: Arc<HandleRegistry>,
}

impl DatasetCatalog {
    /// Discover and partition every class under `root`.
    pub fn scan(root: &Path, config: &PrepConfig) -> Result<Self, DatasetError> {
        config.validate()?;
        if !root.is_dir() {
            return Err(DatasetError::MissingDirectory {
                path: root.to_path_buf(),
            });
        }
        let registry = Arc::new(HandleRegistry::new());
        let mut labels = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let label = entry.file_name().to_string_lossy().into_owned();
            if label.is_empty() {
                continue;
            }
            labels.push(label);
        }
        labels.sort();

        let mut classes = BTreeMap::new();
        for label in labels {
            let class = ClassDataset::open(root, &label, config, Arc::clone(&registry))?;
            classes.insert(label, class);
        }

        Ok(Self {
            root: root.to_path_buf(),
            classes,
            registry,
        })
    }

    /// Root directory the catalog was scanned from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// All class datasets in label order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDataset> {
        self.classes.values()
    }

    /// Look up one class by label.
    pub fn class(&self, label: &str) -> Option<&ClassDataset> {
        self.classes.get(label)
    }

    /// Number of discovered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when the root held no class subdirectories.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registry shared by every class in this catalog.
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Per-class split counts, suitable for a `manifest.json` export.
    pub fn summary(&self) -> CatalogSummary {
        let classes = self
            .classes
            .values()
            .map(|class| ClassSummary {
                label: class.label().to_string(),
                training: class.split_names(Split::Training).len(),
                validation: class.split_names(Split::Validation).len(),
                testing: class.split_names(Split::Testing).len(),
            })
            .collect();
        CatalogSummary { classes }
    }
}

/// Serializable overview of a scanned catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    /// One entry per class, in label order.
    pub classes: Vec<ClassSummary>,
}

/// Split counts for one class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    /// Class label.
    pub label: String,
    /// Image count assigned to training.
    pub training: usize,
    /// Image count assigned to validation.
    pub validation: usize,
    /// Image count assigned to testing.
    pub testing: usize,
}
