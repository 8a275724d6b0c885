//! Closed-form estimates used whenever the service can't be trusted.
//!
//! Both functions are pure: the same metadata always produces the same
//! result, and they never fail.

use crate::types::{CO2Data, Complexity, Confidence, ImageMetadata, ModelInfo, TraditionalCO2Data};

const MIN_GENERATION_CO2: f64 = 0.01;
const MIN_TRANSMISSION_CO2_PER_VIEW: f64 = 0.001;

/// Grams per pixel of generated output.
const GENERATION_CO2_PER_PIXEL: f64 = 1e-6;
/// Grams per binary megabyte of generated output.
const GENERATION_CO2_PER_MB: f64 = 0.5;
/// Grams per binary megabyte delivered to one viewer.
const TRANSMISSION_CO2_PER_MB: f64 = 0.15;

const CO2_PER_DESIGN_HOUR: f64 = 500.0;
const CO2_PER_STOCK_PHOTO: f64 = 100.0;
const CO2_PER_PHOTOSHOOT: f64 = 2000.0;
const CO2_PER_REVISION: f64 = 200.0;

const MB: u64 = 1024 * 1024;

/// Fixed effort profile for one complexity bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityProfile {
    pub complexity: Complexity,
    /// Inclusive upper bound on pixel count, `None` for the catch-all bucket.
    pub max_pixels: Option<u64>,
    /// Inclusive upper bound on byte size, `None` for the catch-all bucket.
    pub max_bytes: Option<u64>,
    pub design_hours: f64,
    pub revisions: u32,
    pub stock_photos: u32,
    pub photoshoot: bool,
}

impl ComplexityProfile {
    fn admits(&self, pixels: u64, bytes: u64) -> bool {
        self.max_pixels.is_none_or(|max| pixels <= max)
            && self.max_bytes.is_none_or(|max| bytes <= max)
    }

    pub fn design_co2(&self) -> f64 {
        let photoshoot = if self.photoshoot { CO2_PER_PHOTOSHOOT } else { 0.0 };
        self.design_hours * CO2_PER_DESIGN_HOUR
            + f64::from(self.stock_photos) * CO2_PER_STOCK_PHOTO
            + photoshoot
            + f64::from(self.revisions) * CO2_PER_REVISION
    }
}

/// Buckets in ascending order. The first one admitting both the pixel count
/// and the byte size wins; the last admits everything.
pub const COMPLEXITY_PROFILES: [ComplexityProfile; 4] = [
    ComplexityProfile {
        complexity: Complexity::Basic,
        max_pixels: Some(500_000),
        max_bytes: Some(MB / 2),
        design_hours: 2.0,
        revisions: 1,
        stock_photos: 0,
        photoshoot: false,
    },
    ComplexityProfile {
        complexity: Complexity::Standard,
        max_pixels: Some(2_100_000),
        max_bytes: Some(2 * MB),
        design_hours: 4.0,
        revisions: 2,
        stock_photos: 1,
        photoshoot: false,
    },
    ComplexityProfile {
        complexity: Complexity::Premium,
        max_pixels: Some(8_300_000),
        max_bytes: Some(5 * MB),
        design_hours: 8.0,
        revisions: 3,
        stock_photos: 2,
        photoshoot: false,
    },
    ComplexityProfile {
        complexity: Complexity::Enterprise,
        max_pixels: None,
        max_bytes: None,
        design_hours: 16.0,
        revisions: 4,
        stock_photos: 3,
        photoshoot: true,
    },
];

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn provenance() -> ModelInfo {
    ModelInfo::from([
        ("source".to_string(), "fallback".to_string()),
        ("method".to_string(), "offline formula".to_string()),
    ])
}

/// Offline AI-path estimate from pixel count and byte size.
pub fn fallback_estimate(metadata: &ImageMetadata) -> CO2Data {
    let pixels = metadata.pixel_count() as f64;
    let size_mb = metadata.file_size_mb();

    let generation = round_to(
        pixels * GENERATION_CO2_PER_PIXEL + size_mb * GENERATION_CO2_PER_MB,
        2,
    );
    let transmission = round_to(size_mb * TRANSMISSION_CO2_PER_MB, 3);

    CO2Data {
        generation_co2: generation.max(MIN_GENERATION_CO2),
        transmission_co2_per_view: transmission.max(MIN_TRANSMISSION_CO2_PER_VIEW),
        confidence: Confidence::Low,
        model_info: Some(provenance()),
    }
}

/// Profile for the given pixel count and byte size.
pub fn complexity_profile(pixels: u64, bytes: u64) -> &'static ComplexityProfile {
    COMPLEXITY_PROFILES
        .iter()
        .find(|p| p.admits(pixels, bytes))
        .unwrap_or(&COMPLEXITY_PROFILES[COMPLEXITY_PROFILES.len() - 1])
}

/// Offline traditional-design estimate.
pub fn fallback_traditional(metadata: &ImageMetadata) -> TraditionalCO2Data {
    let profile = complexity_profile(metadata.pixel_count(), metadata.file_size);
    TraditionalCO2Data {
        design_co2: profile.design_co2(),
        design_time: profile.design_hours,
        revisions: profile.revisions,
        stock_photos: profile.stock_photos,
        photoshoot: profile.photoshoot,
        complexity: profile.complexity,
        confidence: Confidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::tests::{metadata, sample_metadata};

    // =========================================================================
    // fallback_estimate tests
    // =========================================================================

    #[test]
    fn full_hd_banner() {
        let data = fallback_estimate(&sample_metadata());
        assert_eq!(data.generation_co2, 3.27);
        assert_eq!(data.transmission_co2_per_view, 0.358);
        assert_eq!(data.confidence, Confidence::Low);
        assert_eq!(data.model_info.unwrap()["source"], "fallback");
    }

    #[test]
    fn deterministic() {
        let meta = sample_metadata();
        assert_eq!(fallback_estimate(&meta), fallback_estimate(&meta));
    }

    #[test]
    fn tiny_image_hits_floors() {
        let data = fallback_estimate(&metadata(1, 1, 10));
        assert_eq!(data.generation_co2, 0.01);
        assert_eq!(data.transmission_co2_per_view, 0.001);
    }

    #[test]
    fn result_is_within_bounds() {
        assert!(fallback_estimate(&metadata(10_000, 10_000, 10 * MB)).is_within_bounds());
    }

    // =========================================================================
    // fallback_traditional tests
    // =========================================================================

    #[test]
    fn small_banner_is_basic() {
        let data = fallback_traditional(&metadata(728, 90, 40_000));
        assert_eq!(data.complexity, Complexity::Basic);
        // 2h*500 + 0 + 0 + 1*200
        assert_eq!(data.design_co2, 1200.0);
        assert_eq!(data.confidence, Confidence::Low);
    }

    #[test]
    fn full_hd_small_file_is_standard() {
        let data = fallback_traditional(&metadata(1920, 1080, 1_500_000));
        assert_eq!(data.complexity, Complexity::Standard);
        // 4h*500 + 1*100 + 0 + 2*200
        assert_eq!(data.design_co2, 2500.0);
    }

    #[test]
    fn large_file_bumps_bucket() {
        // Pixels fit Standard, bytes only fit Premium.
        let data = fallback_traditional(&sample_metadata());
        assert_eq!(data.complexity, Complexity::Premium);
        // 8h*500 + 2*100 + 0 + 3*200
        assert_eq!(data.design_co2, 4800.0);
    }

    #[test]
    fn huge_image_is_enterprise() {
        let data = fallback_traditional(&metadata(7680, 4320, 3 * MB));
        assert_eq!(data.complexity, Complexity::Enterprise);
        assert!(data.photoshoot);
        // 16h*500 + 3*100 + 2000 + 4*200
        assert_eq!(data.design_co2, 11_100.0);
        assert!(data.is_within_bounds());
    }

    #[test]
    fn bucket_bounds_are_inclusive() {
        assert_eq!(
            complexity_profile(500_000, MB / 2).complexity,
            Complexity::Basic
        );
        assert_eq!(
            complexity_profile(500_001, MB / 2).complexity,
            Complexity::Standard
        );
    }
}
