//! Deterministic split assignment from filename hashes.
//!
//! A filename is hashed with SHA-1, reduced modulo
//! `max_images_per_class + 1`, and scaled into a percentage in `[0, 100)`.
//! The percentage alone decides the split, so the same filename lands in the
//! same split on every run and every machine, independent of directory
//! listing order or class label.

use sha1::{Digest, Sha1};

use crate::config::PrepConfig;

/// Dataset split a file is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    /// Images used to fit the downstream classifier.
    Training,
    /// Images held out for hyperparameter validation.
    Validation,
    /// Images held out for final evaluation.
    Testing,
}

impl Split {
    /// All splits in canonical order.
    pub const ALL: [Split; 3] = [Split::Training, Split::Validation, Split::Testing];

    /// Stable lowercase name used in summaries and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Training => "training",
            Split::Validation => "validation",
            Split::Testing => "testing",
        }
    }
}

/// Map a filename to its stable hash-derived percentage in `[0, 100)`.
///
/// The SHA-1 digest is interpreted as a big-endian integer and reduced modulo
/// `max_images_per_class + 1` before scaling, mirroring the behavior the disk
/// cache and split boundaries were built around.
pub fn name_to_percentage(file_name: &str, max_images_per_class: u64) -> f64 {
    let digest = Sha1::digest(file_name.as_bytes());
    let modulus = u128::from(max_images_per_class) + 1;
    let mut value: u128 = 0;
    for byte in digest {
        value = ((value << 8) | u128::from(byte)) % modulus;
    }
    (value as f64) * (100.0 / max_images_per_class as f64)
}

/// Assign a filename to a split using the configured thresholds.
///
/// The validation band is `[0, validation_percentage)` and the testing band is
/// `[validation_percentage, testing_percentage)`; everything else trains.
/// When the two thresholds are equal the testing band is empty.
pub fn assign(file_name: &str, config: &PrepConfig) -> Split {
    let percentage = name_to_percentage(file_name, config.max_images_per_class);
    if percentage < config.validation_percentage {
        Split::Validation
    } else if percentage < config.testing_percentage {
        Split::Testing
    } else {
        Split::Training
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> PrepConfig {
        PrepConfig::default()
    }

    #[test]
    fn assignment_is_pure_and_stable() {
        let config = default_config();
        let first = assign("kitten_01.png", &config);
        for _ in 0..8 {
            assert_eq!(assign("kitten_01.png", &config), first);
        }
    }

    #[test]
    fn known_sha1_percentage_for_dog001() {
        // SHA-1("dog001.jpg") mod 2^27 scales to 85.91001842848969.
        let percentage = name_to_percentage("dog001.jpg", (1 << 27) - 1);
        assert!((percentage - 85.910_018_428_489_69).abs() < 1e-9);
        assert_eq!(assign("dog001.jpg", &default_config()), Split::Training);
    }

    #[test]
    fn low_percentage_names_go_to_validation() {
        // SHA-1("img0015.jpg") scales to 2.582824994495697.
        let percentage = name_to_percentage("img0015.jpg", (1 << 27) - 1);
        assert!(percentage < 10.0);
        assert_eq!(assign("img0015.jpg", &default_config()), Split::Validation);
    }

    #[test]
    fn testing_band_is_empty_with_equal_default_thresholds() {
        // With validation_percentage == testing_percentage (the defaults) the
        // testing band [10, 10) selects nothing; only widening the band does.
        let defaults = default_config();
        let widened = PrepConfig {
            testing_percentage: 20.0,
            ..PrepConfig::default()
        };
        let mut saw_testing_when_widened = false;
        for idx in 0..500 {
            let name = format!("img{idx:04}.jpg");
            assert_ne!(assign(&name, &defaults), Split::Testing);
            if assign(&name, &widened) == Split::Testing {
                saw_testing_when_widened = true;
            }
        }
        assert!(saw_testing_when_widened);
    }

    #[test]
    fn percentage_stays_in_range() {
        for idx in 0..200 {
            let name = format!("sample_{idx}.png");
            let percentage = name_to_percentage(&name, (1 << 27) - 1);
            assert!((0.0..100.0).contains(&percentage), "{name}: {percentage}");
        }
    }
}
