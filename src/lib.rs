//! Library exports for reuse in binaries and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Two-tier bottleneck feature cache.
pub mod cache;
/// Dataset preparation configuration.
pub mod config;
/// Class discovery and split bookkeeping.
pub mod dataset;
/// Feature extractor seam and built-in extractors.
pub mod extract;
/// Logging setup.
pub mod logging;
/// Deterministic split assignment.
pub mod partition;
