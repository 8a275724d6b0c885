//! Resolution tiers and the traditional-design cost model.
//!
//! A banner is bucketed by pixel count into one of three ordered tiers. Each
//! tier carries a fixed, synthetic record of what producing an equivalent
//! asset by hand would take (designer hours, revision rounds, stock photos,
//! an optional photoshoot). The record prices out as:
//!
//! ```text
//! designer   = design_hours × CO2_PER_DESIGN_HOUR
//! revisions  = revisions × (design_hours × 0.3) × CO2_PER_DESIGN_HOUR
//! stock      = stock_photos × CO2_PER_STOCK_PHOTO
//! photoshoot = photoshoot ? PHOTOSHOOT_CO2 : 0
//! total      = designer + revisions + stock + photoshoot + computer_usage
//! ```
//!
//! Totals depend only on static data, so they are computed once on first use
//! and served from a table afterwards.

use crate::types::ImageMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Grams of CO2 per designer hour (workstation, office, commute share).
pub const CO2_PER_DESIGN_HOUR: f64 = 250.0;
/// Grams of CO2 per licensed stock photo (search, download, storage).
pub const CO2_PER_STOCK_PHOTO: f64 = 50.0;
/// Grams of CO2 for a product photoshoot (travel, lighting, equipment).
pub const PHOTOSHOOT_CO2: f64 = 5_000.0;
/// Share of the original design time each revision round costs.
pub const REVISION_TIME_FACTOR: f64 = 0.3;

/// Pixel-count bucket, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResolutionTier {
    Low,
    Medium,
    High,
}

impl ResolutionTier {
    /// All tiers in ascending order.
    pub const ALL: [ResolutionTier; 3] = [
        ResolutionTier::Low,
        ResolutionTier::Medium,
        ResolutionTier::High,
    ];

    /// Inclusive upper pixel-count bound. `None` means unbounded.
    pub fn max_pixels(self) -> Option<u64> {
        match self {
            ResolutionTier::Low => Some(500_000),
            ResolutionTier::Medium => Some(2_073_600), // 1920x1080
            ResolutionTier::High => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResolutionTier::Low => "Low resolution",
            ResolutionTier::Medium => "Medium resolution",
            ResolutionTier::High => "High resolution",
        }
    }

    /// Fixed cost record for producing this tier by hand.
    pub fn cost_model(self) -> &'static TraditionalCostModel {
        &COST_MODELS[self as usize]
    }

    /// Memoized total CO2 (grams) of the tier's cost model.
    pub fn traditional_total(self) -> f64 {
        TIER_TOTALS[self as usize]
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Synthetic description of a traditional design job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraditionalCostModel {
    pub design_hours: f64,
    pub revisions: u32,
    pub stock_photos: u32,
    pub photoshoot: bool,
    /// Grams of CO2 for rendering, exports and file transfers.
    pub computer_usage_co2: f64,
}

impl TraditionalCostModel {
    pub fn designer_co2(&self) -> f64 {
        self.design_hours * CO2_PER_DESIGN_HOUR
    }

    pub fn revision_co2(&self) -> f64 {
        f64::from(self.revisions) * (self.design_hours * REVISION_TIME_FACTOR) * CO2_PER_DESIGN_HOUR
    }

    pub fn stock_photo_co2(&self) -> f64 {
        f64::from(self.stock_photos) * CO2_PER_STOCK_PHOTO
    }

    pub fn photoshoot_co2(&self) -> f64 {
        if self.photoshoot { PHOTOSHOOT_CO2 } else { 0.0 }
    }

    pub fn total_co2(&self) -> f64 {
        self.designer_co2()
            + self.revision_co2()
            + self.stock_photo_co2()
            + self.photoshoot_co2()
            + self.computer_usage_co2
    }
}

static COST_MODELS: [TraditionalCostModel; 3] = [
    TraditionalCostModel {
        design_hours: 2.0,
        revisions: 1,
        stock_photos: 1,
        photoshoot: false,
        computer_usage_co2: 100.0,
    },
    TraditionalCostModel {
        design_hours: 4.0,
        revisions: 2,
        stock_photos: 2,
        photoshoot: false,
        computer_usage_co2: 200.0,
    },
    TraditionalCostModel {
        design_hours: 8.0,
        revisions: 3,
        stock_photos: 3,
        photoshoot: true,
        computer_usage_co2: 400.0,
    },
];

static TIER_TOTALS: LazyLock<[f64; 3]> =
    LazyLock::new(|| ResolutionTier::ALL.map(|tier| tier.cost_model().total_co2()));

/// Bucket an image by pixel count.
///
/// Thresholds are checked in ascending order; the last tier catches anything
/// above the penultimate bound.
pub fn classify(metadata: &ImageMetadata) -> ResolutionTier {
    classify_pixels(metadata.pixel_count())
}

pub fn classify_pixels(pixels: u64) -> ResolutionTier {
    ResolutionTier::ALL
        .into_iter()
        .find(|tier| tier.max_pixels().is_none_or(|max| pixels <= max))
        .unwrap_or(ResolutionTier::High)
}
