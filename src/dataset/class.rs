use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PrepConfig;
use crate::partition::{self, Split};

use super::{DatasetError, HandleRegistry, ImageHandle};

/// One class label with its images partitioned into the three splits.
///
/// Construction lists the class directory, validates the image count against
/// the configured bounds, and assigns every filename with the deterministic
/// partitioner. The three sequences are disjoint and their union is exactly
/// the class's image set; filenames are held sorted so results never depend
/// on directory listing order.
#[derive(Debug)]
pub struct ClassDataset {
    label: String,
    dir: PathBuf,
    registry: Arc<HandleRegistry>,
    training: Vec<String>,
    validation: Vec<String>,
    testing: Vec<String>,
}

impl ClassDataset {
    /// Open the class directory `root/label` and partition its images.
    pub fn open(
        root: &Path,
        label: &str,
        config: &PrepConfig,
        registry: Arc<HandleRegistry>,
    ) -> Result<Self, DatasetError> {
        let dir = root.join(label);
        if !dir.is_dir() {
            return Err(DatasetError::MissingDirectory { path: dir });
        }
        let names = list_image_files(&dir)?;
        let count = names.len();
        if count < config.min_images_per_class {
            return Err(DatasetError::ClassTooSmall {
                label: label.to_string(),
                count,
                min: config.min_images_per_class,
            });
        }
        if count as u64 > config.max_images_per_class {
            return Err(DatasetError::ClassTooLarge {
                label: label.to_string(),
                count,
                max: config.max_images_per_class,
            });
        }

        let mut training = Vec::new();
        let mut validation = Vec::new();
        let mut testing = Vec::new();
        for name in names {
            match partition::assign(&name, config) {
                Split::Training => training.push(name),
                Split::Validation => validation.push(name),
                Split::Testing => testing.push(name),
            }
        }

        Ok(Self {
            label: label.to_string(),
            dir,
            registry,
            training,
            validation,
            testing,
        })
    }

    /// Class label (the directory name).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Directory the class's images live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Total number of images across all splits.
    pub fn len(&self) -> usize {
        self.training.len() + self.validation.len() + self.testing.len()
    }

    /// True when the class holds no images (never the case after a
    /// successful [`ClassDataset::open`] with a non-zero minimum).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filenames assigned to one split, in sorted order.
    pub fn split_names(&self, split: Split) -> &[String] {
        match split {
            Split::Training => &self.training,
            Split::Validation => &self.validation,
            Split::Testing => &self.testing,
        }
    }

    /// Shared handles for one split, interned through the registry.
    pub fn split(&self, split: Split) -> Vec<Arc<ImageHandle>> {
        self.split_names(split)
            .iter()
            .map(|name| self.registry.intern(&self.dir.join(name), &self.label))
            .collect()
    }

    /// Handles for the training split.
    pub fn training(&self) -> Vec<Arc<ImageHandle>> {
        self.split(Split::Training)
    }

    /// Handles for the validation split.
    pub fn validation(&self) -> Vec<Arc<ImageHandle>> {
        self.split(Split::Validation)
    }

    /// Handles for the testing split.
    pub fn testing(&self) -> Vec<Arc<ImageHandle>> {
        self.split(Split::Testing)
    }
}

fn list_image_files(dir: &Path) -> Result<Vec<String>, DatasetError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
