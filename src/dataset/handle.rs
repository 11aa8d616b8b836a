use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A labeled image file discovered under a class directory.
///
/// Immutable once created; the filename doubles as the split-hash input and
/// the disk cache key, so renaming an image changes both its split and its
/// cache entry.
#[derive(Debug)]
pub struct ImageHandle {
    path: PathBuf,
    file_name: String,
    label: String,
}

impl ImageHandle {
    /// Build a handle for an image path with its class label.
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            label: label.into(),
        }
    }

    /// Full path to the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base filename used for split hashing and cache file naming.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Class label the image was discovered under.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Interner that hands out one shared [`ImageHandle`] per path.
///
/// Constructed at catalog-build time and passed into each class dataset, so
/// repeated lookups of the same path (even across differently labeled scans)
/// reuse the same handle instead of accumulating duplicates in hidden
/// process-wide state.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    handles: Mutex<HashMap<PathBuf, Arc<ImageHandle>>>,
}

impl HandleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared handle for `path`, creating it with `label` on first
    /// lookup. The first registration wins; later labels are ignored.
    pub fn intern(&self, path: &Path, label: &str) -> Arc<ImageHandle> {
        let mut handles = self.handles.lock().expect("handle registry mutex poisoned");
        handles
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(ImageHandle::new(path, label)))
            .clone()
    }

    /// Number of distinct paths registered so far.
    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .expect("handle registry mutex poisoned")
            .len()
    }

    /// True when no handle has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_reuses_the_same_handle() {
        let registry = HandleRegistry::new();
        let a = registry.intern(Path::new("/data/dogs/dog001.jpg"), "dogs");
        let b = registry.intern(Path::new("/data/dogs/dog001.jpg"), "dogs");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn first_label_wins_on_relabeled_rescan() {
        let registry = HandleRegistry::new();
        let first = registry.intern(Path::new("/data/x/img.png"), "cats");
        let second = registry.intern(Path::new("/data/x/img.png"), "dogs");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.label(), "cats");
    }

    #[test]
    fn handle_exposes_basename() {
        let handle = ImageHandle::new("/data/dogs/dog001.jpg", "dogs");
        assert_eq!(handle.file_name(), "dog001.jpg");
        assert_eq!(handle.label(), "dogs");
    }
}
