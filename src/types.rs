//! Value types shared by every pipeline stage.
//!
//! Everything here is produced fresh per upload and handed downstream
//! read-only. Field names serialize in the camelCase shape the presentation
//! layer consumes (`generationCO2`, `fileSizeFormatted`, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Upper bound for a believable generation estimate, in grams.
pub const MAX_GENERATION_CO2: f64 = 1_000_000.0;
/// Upper bound for a believable per-view transmission estimate, in grams.
pub const MAX_TRANSMISSION_CO2_PER_VIEW: f64 = 10_000.0;
/// Upper bound for a believable traditional design estimate, in grams.
pub const MAX_DESIGN_CO2: f64 = 1_000_000.0;
/// Upper bound for reported design time, in hours.
pub const MAX_DESIGN_HOURS: f64 = 1_000.0;
/// Upper bound for reported revision rounds and stock photo counts.
pub const MAX_ASSET_COUNT: u32 = 100;

/// An opaque binary upload as handed over by the caller.
///
/// The payload is reference-counted so decode work can move to a blocking
/// thread without copying the bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    /// May be empty when the caller could not determine it.
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk. No MIME type is attached; the validator and
    /// extractor fall back to the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, "", data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

/// Structural facts about one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// `"{width}x{height}"`
    pub resolution: String,
    pub file_size: u64,
    /// Two-ladder display size, see [`crate::metadata::format_byte_size_two_ladder`].
    pub file_size_formatted: String,
    /// Uppercase token such as `PNG` or `JPG`.
    pub format: String,
    /// Display only, never used in a calculation.
    pub file_name: String,
}

impl ImageMetadata {
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// File size in binary megabytes (`bytes / 1024²`).
    pub fn file_size_mb(&self) -> f64 {
        self.file_size as f64 / (1024.0 * 1024.0)
    }
}

/// How much an estimate should be trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            other => Err(format!("unknown confidence level: {other}")),
        }
    }
}

/// Free-form provenance notes attached to an estimate. Display only.
pub type ModelInfo = BTreeMap<String, String>;

/// Emission estimate for the AI generation pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CO2Data {
    /// Grams of CO2 spent generating the asset.
    #[serde(rename = "generationCO2")]
    pub generation_co2: f64,
    /// Grams of CO2 spent delivering the asset once.
    #[serde(rename = "transmissionCO2PerView")]
    pub transmission_co2_per_view: f64,
    pub confidence: Confidence,
    #[serde(rename = "modelInfo", default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

/// A field that fell outside `0..=max`, as `(name, value, max)`.
pub type BoundsViolation = (&'static str, f64, f64);

impl CO2Data {
    /// First figure that is non-finite, negative or above its bound.
    pub fn out_of_bounds(&self) -> Option<BoundsViolation> {
        first_violation(&[
            ("generationCO2", self.generation_co2, MAX_GENERATION_CO2),
            (
                "transmissionCO2PerView",
                self.transmission_co2_per_view,
                MAX_TRANSMISSION_CO2_PER_VIEW,
            ),
        ])
    }

    pub fn is_within_bounds(&self) -> bool {
        self.out_of_bounds().is_none()
    }
}

/// Effort bucket for a traditionally designed banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    Basic,
    Standard,
    Premium,
    Enterprise,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Complexity::Basic => "Basic",
            Complexity::Standard => "Standard",
            Complexity::Premium => "Premium",
            Complexity::Enterprise => "Enterprise",
        };
        f.write_str(name)
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Complexity::Basic),
            "standard" => Ok(Complexity::Standard),
            "premium" => Ok(Complexity::Premium),
            "enterprise" => Ok(Complexity::Enterprise),
            other => Err(format!("unknown complexity: {other}")),
        }
    }
}

/// Emission estimate for a human design workflow producing the same asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraditionalCO2Data {
    #[serde(rename = "designCO2")]
    pub design_co2: f64,
    /// Hours of designer time.
    #[serde(rename = "designTime")]
    pub design_time: f64,
    pub revisions: u32,
    #[serde(rename = "stockPhotos")]
    pub stock_photos: u32,
    pub photoshoot: bool,
    pub complexity: Complexity,
    pub confidence: Confidence,
}

impl TraditionalCO2Data {
    pub fn out_of_bounds(&self) -> Option<BoundsViolation> {
        let max_count = f64::from(MAX_ASSET_COUNT);
        first_violation(&[
            ("designCO2", self.design_co2, MAX_DESIGN_CO2),
            ("designTime", self.design_time, MAX_DESIGN_HOURS),
            ("revisions", f64::from(self.revisions), max_count),
            ("stockPhotos", f64::from(self.stock_photos), max_count),
        ])
    }

    pub fn is_within_bounds(&self) -> bool {
        self.out_of_bounds().is_none()
    }
}

fn first_violation(checks: &[BoundsViolation]) -> Option<BoundsViolation> {
    checks
        .iter()
        .copied()
        .find(|&(_, value, max)| !(value.is_finite() && (0.0..=max).contains(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co2(generation: f64, per_view: f64) -> CO2Data {
        CO2Data {
            generation_co2: generation,
            transmission_co2_per_view: per_view,
            confidence: Confidence::Medium,
            model_info: None,
        }
    }

    #[test]
    fn uploaded_file_extension_is_lowercased() {
        let file = UploadedFile::new("Banner.PNG", "", vec![1u8, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("png"));
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn uploaded_file_without_extension() {
        let file = UploadedFile::new("banner", "image/png", Vec::new());
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn pixel_count_does_not_overflow_u32() {
        let meta = ImageMetadata {
            width: 70_000,
            height: 70_000,
            resolution: "70000x70000".into(),
            file_size: 0,
            file_size_formatted: "0 Bytes".into(),
            format: "PNG".into(),
            file_name: "huge.png".into(),
        };
        assert_eq!(meta.pixel_count(), 4_900_000_000);
    }

    #[test]
    fn bounds_accept_limits() {
        assert!(co2(0.0, 0.0).is_within_bounds());
        assert!(co2(MAX_GENERATION_CO2, MAX_TRANSMISSION_CO2_PER_VIEW).is_within_bounds());
    }

    #[test]
    fn bounds_reject_negative_and_oversized() {
        assert!(!co2(-0.1, 1.0).is_within_bounds());
        assert!(!co2(1.0, -0.1).is_within_bounds());
        assert!(!co2(MAX_GENERATION_CO2 + 1.0, 1.0).is_within_bounds());
        assert!(!co2(1.0, MAX_TRANSMISSION_CO2_PER_VIEW + 1.0).is_within_bounds());
        assert!(!co2(f64::NAN, 1.0).is_within_bounds());
        assert!(!co2(1.0, f64::INFINITY).is_within_bounds());
    }

    #[test]
    fn out_of_bounds_names_the_first_offending_field() {
        assert_eq!(co2(1.0, 2.0).out_of_bounds(), None);
        assert_eq!(
            co2(1.0, -0.5).out_of_bounds(),
            Some(("transmissionCO2PerView", -0.5, MAX_TRANSMISSION_CO2_PER_VIEW))
        );
        assert_eq!(
            co2(MAX_GENERATION_CO2 + 1.0, -0.5).out_of_bounds(),
            Some(("generationCO2", MAX_GENERATION_CO2 + 1.0, MAX_GENERATION_CO2))
        );
    }

    #[test]
    fn co2_data_serializes_with_display_keys() {
        let json = serde_json::to_value(co2(1.5, 0.25)).unwrap();
        assert_eq!(json["generationCO2"], 1.5);
        assert_eq!(json["transmissionCO2PerView"], 0.25);
        assert_eq!(json["confidence"], "medium");
        assert!(json.get("modelInfo").is_none());
    }

    #[test]
    fn confidence_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Confidence>(), Ok(Confidence::High));
        assert_eq!(" low ".parse::<Confidence>(), Ok(Confidence::Low));
        assert!("certain".parse::<Confidence>().is_err());
    }

    #[test]
    fn complexity_parses_case_insensitively() {
        assert_eq!("premium".parse::<Complexity>(), Ok(Complexity::Premium));
        assert_eq!("ENTERPRISE".parse::<Complexity>(), Ok(Complexity::Enterprise));
        assert_eq!(" Basic".parse::<Complexity>(), Ok(Complexity::Basic));
        assert!("Galactic".parse::<Complexity>().is_err());
    }

    #[test]
    fn traditional_bounds() {
        let mut data = TraditionalCO2Data {
            design_co2: 2_500.0,
            design_time: 4.0,
            revisions: 2,
            stock_photos: 1,
            photoshoot: false,
            complexity: Complexity::Standard,
            confidence: Confidence::Medium,
        };
        assert!(data.is_within_bounds());
        data.revisions = MAX_ASSET_COUNT + 1;
        assert!(!data.is_within_bounds());
        data.revisions = 2;
        data.design_time = -1.0;
        assert_eq!(
            data.out_of_bounds(),
            Some(("designTime", -1.0, MAX_DESIGN_HOURS))
        );
    }
}
