//! End-to-end analysis of one banner.
//!
//! ```text
//! UploadedFile ─▶ validate ─▶ metadata ─▶ estimate ─┬─▶ totals ─▶ recovery metrics
//!                                     └─▶ tier ────┘
//!                                     └─▶ traditional estimate (optional)
//! ```
//!
//! Validation and decode failures stop the pipeline and reach the caller as
//! [`PipelineError`]. Estimation never fails; see [`crate::estimate`]. Each
//! call is independent and holds no state between invocations.

use crate::estimate::Estimator;
use crate::metadata::{self, DecodeError};
use crate::recovery::{self, InvalidArgument, MetricSet, RecoveryMetrics};
use crate::tier::{self, ResolutionTier};
use crate::types::{CO2Data, ImageMetadata, TraditionalCO2Data, UploadedFile};
use crate::validate::{self, ValidationError};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
}

/// Per-run knobs, usually taken from [`crate::config::AppConfig`] and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub views: u64,
    pub metrics: MetricSet,
    /// Also ask for a traditional-design estimate instead of relying on the
    /// tier baseline alone.
    pub detailed_traditional: bool,
    pub max_size_mb: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            views: 1_000_000,
            metrics: MetricSet::default(),
            detailed_traditional: false,
            max_size_mb: validate::DEFAULT_MAX_SIZE_MB,
        }
    }
}

/// Everything derived for one banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub metadata: ImageMetadata,
    pub estimate: CO2Data,
    pub tier: ResolutionTier,
    /// Memoized traditional total for [`Self::tier`], in grams.
    pub tier_baseline_co2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traditional: Option<TraditionalCO2Data>,
    pub views: u64,
    pub ai_total_co2: f64,
    pub ai_total_display: String,
    pub traditional_total_co2: f64,
    pub traditional_total_display: String,
    /// `traditional - ai`; negative when the AI path is worse.
    pub savings_co2: f64,
    pub recovery: RecoveryMetrics,
}

impl Analysis {
    /// Bytes delivered over the whole campaign.
    pub fn campaign_transfer_bytes(&self) -> u64 {
        self.metadata.file_size.saturating_mul(self.views)
    }

    /// Design CO2 of the traditional path, without transmission.
    pub fn traditional_design_co2(&self) -> f64 {
        self.traditional
            .as_ref()
            .map_or(self.tier_baseline_co2, |t| t.design_co2)
    }
}

/// Validate and decode an upload without estimating anything.
pub async fn inspect(file: &UploadedFile, max_size_mb: f64) -> Result<ImageMetadata, PipelineError> {
    validate::check(file, max_size_mb)?;
    Ok(metadata::extract(file).await?)
}

/// Run the full pipeline for one upload.
pub async fn analyze(
    file: &UploadedFile,
    estimator: &Estimator,
    options: &AnalysisOptions,
) -> Result<Analysis, PipelineError> {
    let metadata = inspect(file, options.max_size_mb).await?;
    let estimate = estimator.estimate(&metadata).await;
    let traditional = if options.detailed_traditional {
        Some(estimator.estimate_traditional(&metadata).await)
    } else {
        None
    };
    build_analysis(metadata, estimate, traditional, options)
}

/// Derive totals and metrics from already obtained estimates.
pub fn build_analysis(
    metadata: ImageMetadata,
    estimate: CO2Data,
    traditional: Option<TraditionalCO2Data>,
    options: &AnalysisOptions,
) -> Result<Analysis, PipelineError> {
    let tier = tier::classify(&metadata);
    let tier_baseline_co2 = tier.traditional_total();
    let views = options.views as f64;

    let ai_total_co2 = recovery::total_co2(
        estimate.generation_co2,
        estimate.transmission_co2_per_view,
        views,
    )?;
    let design_co2 = traditional
        .as_ref()
        .map_or(tier_baseline_co2, |t| t.design_co2);
    let traditional_total_co2 =
        recovery::total_co2(design_co2, estimate.transmission_co2_per_view, views)?;

    let recovery = recovery::recovery_metrics(ai_total_co2 / 1000.0, options.metrics)?;

    Ok(Analysis {
        ai_total_display: recovery::format_co2(ai_total_co2)?,
        traditional_total_display: recovery::format_co2(traditional_total_co2)?,
        savings_co2: traditional_total_co2 - ai_total_co2,
        metadata,
        estimate,
        tier,
        tier_baseline_co2,
        traditional,
        views: options.views,
        ai_total_co2,
        traditional_total_co2,
        recovery,
    })
}

/// Expand CLI arguments into image files.
///
/// Files are kept as given. Directories contribute their direct children
/// with a supported extension, sorted by path.
pub fn collect_images(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && has_supported_extension(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(validate::is_supported_extension)
}
