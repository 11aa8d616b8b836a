//! Two-tier bottleneck cache: process memory backed by on-disk text files.
//!
//! Each image resolves to one feature vector per extractor identity. Lookup
//! consults the in-memory tier first, then a disk file named
//! `<basename>_<identity>.txt` under the cache root, and only then reads the
//! image and invokes the extractor, persisting the result for later runs.
//! File presence is the sole cache-hit signal; the identity string is trusted
//! as the validity key, so extractor changes must come with a new identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::dataset::ImageHandle;
use crate::extract::{ExtractError, Extractor};

/// Fixed-length vector of bottleneck activations for one image.
pub type FeatureVector = Vec<f32>;

/// Errors surfaced by cache lookups.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The source image file is gone.
    #[error("image file not found: {path}")]
    MissingImage { path: PathBuf },
    /// The extractor failed on the image bytes.
    #[error("feature extraction failed for {path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
    /// An existing cache file did not parse as a feature vector.
    #[error("invalid cache entry {path}: {source}")]
    InvalidEntry {
        path: PathBuf,
        #[source]
        source: std::num::ParseFloatError,
    },
    /// Reading the image or writing the cache file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

type Slot = Arc<Mutex<Option<Arc<FeatureVector>>>>;

/// Process-wide feature store shared across classes.
///
/// The extractor is injected at construction, so the memory tier can key by
/// image path alone while disk files stay namespaced by the extractor
/// identity. Lookups take a per-key lock: of N concurrent requests for one
/// image, exactly one computes and writes, the rest block and then read the
/// populated entry.
pub struct FeatureCache {
    cache_dir: PathBuf,
    extractor: Arc<dyn Extractor>,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl FeatureCache {
    /// Create a cache rooted at `cache_dir` backed by `extractor`.
    pub fn new(cache_dir: impl Into<PathBuf>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            extractor,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Directory cache files are written under.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Identity string of the injected extractor.
    pub fn extractor_identity(&self) -> &str {
        self.extractor.identity()
    }

    /// Disk location of the cache entry for one image.
    pub fn cache_file_path(&self, handle: &ImageHandle) -> PathBuf {
        self.cache_dir.join(format!(
            "{}_{}.txt",
            handle.file_name(),
            self.extractor.identity()
        ))
    }

    /// Resolve the feature vector for `handle`: memory, then disk, then a
    /// fresh extraction that populates both tiers.
    pub fn get(&self, handle: &ImageHandle) -> Result<Arc<FeatureVector>, CacheError> {
        let slot = {
            let mut slots = self.slots.lock().expect("cache slot map mutex poisoned");
            slots
                .entry(handle.path().to_path_buf())
                .or_default()
                .clone()
        };
        let mut entry = slot.lock().expect("cache slot mutex poisoned");
        if let Some(vector) = entry.as_ref() {
            return Ok(Arc::clone(vector));
        }

        let cache_path = self.cache_file_path(handle);
        if cache_path.is_file() {
            let text = std::fs::read_to_string(&cache_path)?;
            let vector = parse_vector(&text).map_err(|source| CacheError::InvalidEntry {
                path: cache_path,
                source,
            })?;
            let vector = Arc::new(vector);
            *entry = Some(Arc::clone(&vector));
            return Ok(vector);
        }

        let image_bytes = std::fs::read(handle.path()).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CacheError::MissingImage {
                    path: handle.path().to_path_buf(),
                }
            } else {
                CacheError::Io(source)
            }
        })?;
        let vector = self
            .extractor
            .extract(&image_bytes)
            .map_err(|source| CacheError::Extraction {
                path: handle.path().to_path_buf(),
                source,
            })?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::write(&cache_path, encode_vector(&vector))?;

        let vector = Arc::new(vector);
        *entry = Some(Arc::clone(&vector));
        Ok(vector)
    }
}

/// Encode a vector as comma-separated decimal text.
///
/// Values use Rust's shortest round-trip formatting, so parsing the text
/// yields bit-identical floats.
fn encode_vector(values: &[f32]) -> String {
    let mut out = String::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&value.to_string());
    }
    out
}

fn parse_vector(text: &str) -> Result<FeatureVector, std::num::ParseFloatError> {
    text.split(',').map(|field| field.trim().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    struct CountingExtractor {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingExtractor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Extractor for CountingExtractor {
        fn identity(&self) -> &str {
            "counting_v1"
        }

        fn extract(&self, image_bytes: &[u8]) -> Result<Vec<f32>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            if self.fail {
                return Err("synthetic extractor failure".into());
            }
            Ok(vec![image_bytes.len() as f32, -0.5, 1.25])
        }
    }

    fn handle_for(dir: &Path, name: &str) -> ImageHandle {
        ImageHandle::new(dir.join(name), "class_a")
    }

    #[test]
    fn second_get_hits_memory_without_reextraction() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "a.jpg");
        std::fs::write(image.path(), b"pixels").unwrap();
        let extractor = Arc::new(CountingExtractor::new());
        let cache = FeatureCache::new(dir.path().join("bottleneck"), extractor.clone());

        let first = cache.get(&image).unwrap();
        assert!(cache.cache_file_path(&image).is_file());
        let second = cache.get(&image).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(extractor.calls(), 1);
    }

    #[test]
    fn disk_tier_survives_a_new_cache_instance() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "a.jpg");
        std::fs::write(image.path(), b"pixels").unwrap();
        let cache_dir = dir.path().join("bottleneck");

        let warm = Arc::new(CountingExtractor::new());
        let expected = FeatureCache::new(&cache_dir, warm.clone()).get(&image).unwrap();
        assert_eq!(warm.calls(), 1);

        let cold = Arc::new(CountingExtractor::new());
        let reloaded = FeatureCache::new(&cache_dir, cold.clone()).get(&image).unwrap();
        assert_eq!(cold.calls(), 0);
        assert_eq!(*reloaded, *expected);
    }

    #[test]
    fn cache_file_name_embeds_basename_and_identity() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "dog001.jpg");
        let cache = FeatureCache::new(dir.path().join("bottleneck"), Arc::new(CountingExtractor::new()));
        assert_eq!(
            cache.cache_file_path(&image),
            dir.path().join("bottleneck").join("dog001.jpg_counting_v1.txt")
        );
    }

    #[test]
    fn missing_image_is_reported() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "gone.jpg");
        let cache = FeatureCache::new(dir.path().join("bottleneck"), Arc::new(CountingExtractor::new()));
        let err = cache.get(&image).unwrap_err();
        assert!(matches!(err, CacheError::MissingImage { .. }));
    }

    #[test]
    fn extractor_failure_wraps_the_offending_path() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "bad.jpg");
        std::fs::write(image.path(), b"pixels").unwrap();
        let extractor = Arc::new(CountingExtractor {
            fail: true,
            ..CountingExtractor::new()
        });
        let cache = FeatureCache::new(dir.path().join("bottleneck"), extractor);
        match cache.get(&image).unwrap_err() {
            CacheError::Extraction { path, .. } => assert_eq!(path, image.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_cache_file_is_an_invalid_entry() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "a.jpg");
        std::fs::write(image.path(), b"pixels").unwrap();
        let cache_dir = dir.path().join("bottleneck");
        let cache = FeatureCache::new(&cache_dir, Arc::new(CountingExtractor::new()));
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache.cache_file_path(&image), "0.5,not-a-float").unwrap();
        let err = cache.get(&image).unwrap_err();
        assert!(matches!(err, CacheError::InvalidEntry { .. }));
    }

    #[test]
    fn concurrent_requests_extract_exactly_once() {
        let dir = tempdir().unwrap();
        let image = handle_for(dir.path(), "a.jpg");
        std::fs::write(image.path(), b"pixels").unwrap();
        let extractor = Arc::new(CountingExtractor {
            delay: Duration::from_millis(40),
            ..CountingExtractor::new()
        });
        let cache = FeatureCache::new(dir.path().join("bottleneck"), extractor.clone());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache.get(&image).unwrap();
                });
            }
        });
        assert_eq!(extractor.calls(), 1);
    }

    #[test]
    fn encode_parse_round_trip_is_exact() {
        let original = vec![0.0_f32, -1.5, 3.141_592_7, 1e-7, f32::MAX, -0.333_333_34];
        let parsed = parse_vector(&encode_vector(&original)).unwrap();
        assert_eq!(parsed, original);
    }
}
