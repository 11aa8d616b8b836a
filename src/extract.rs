//! Feature extractor seam for the bottleneck cache.
//!
//! The upstream network is opaque to this crate: anything that turns image
//! bytes into a fixed-length vector can back the cache. Implementations must
//! be deterministic for a fixed `identity()` string, since that string is the
//! only thing keying cached vectors on disk.

use image::imageops::FilterType;

/// Error type surfaced by extractor implementations.
pub type ExtractError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque image-to-vector function backing the bottleneck cache.
pub trait Extractor: Send + Sync {
    /// Versioned model identifier keying the disk cache. Integrators must
    /// bump this string whenever the produced vectors change, or stale cache
    /// files will be served.
    fn identity(&self) -> &str;

    /// Compute the feature vector for one image. The output length must be
    /// the same for every input.
    fn extract(&self, image_bytes: &[u8]) -> Result<Vec<f32>, ExtractError>;
}

/// Thumbnail edge length used by [`PixelStatExtractor`].
const THUMB_EDGE: u32 = 8;
/// Output dimension of [`PixelStatExtractor`].
pub const PIXEL_STAT_DIM: usize = (THUMB_EDGE * THUMB_EDGE) as usize;

/// Model identifier for the built-in pixel extractor.
pub const PIXEL_STAT_MODEL_ID: &str = "gray_thumb8x8__luma__norm01_v1";

/// Built-in extractor that decodes an image and emits a normalized grayscale
/// thumbnail as a 64-element vector.
///
/// Not a learned embedding; it exists so the preparation pipeline runs end to
/// end without an external network and as a reference implementation of the
/// extractor contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelStatExtractor;

impl Extractor for PixelStatExtractor {
    fn identity(&self) -> &str {
        PIXEL_STAT_MODEL_ID
    }

    fn extract(&self, image_bytes: &[u8]) -> Result<Vec<f32>, ExtractError> {
        let decoded = image::load_from_memory(image_bytes)?;
        let thumb = decoded
            .resize_exact(THUMB_EDGE, THUMB_EDGE, FilterType::Triangle)
            .to_luma8();
        let mut out = Vec::with_capacity(PIXEL_STAT_DIM);
        for pixel in thumb.pixels() {
            out.push(f32::from(pixel.0[0]) / 255.0);
        }
        Ok(out)
    }
}
