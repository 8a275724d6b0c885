//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every banner leads with its positional index and file name. The source
//! path and every derived figure follow as indented context lines, so a run
//! over a folder reads as an inventory of results.
//!
//! # Output Format
//!
//! ## Estimate
//!
//! ```text
//! 001 banner.png
//!     Source: banners/banner.png
//!     Image: 1920x1080 PNG, 2.4 MB
//!     Tier: Medium resolution (baseline 1.90kg)
//!     AI generation: 500g + 0.1500g/view (high)
//!     Campaign: 1,000,000 views, 2328.31 GB transferred
//!     AI total: 151kg
//!     Traditional total: 152kg
//!     Saved: 1.40kg
//!     Offsets: 8 trees, 5017 bottles, 31 bee hotels, 76 walking weeks
//! ```
//!
//! With `--detailed` an extra `Traditional design:` line describes the
//! estimated design job.
//!
//! ## Check
//!
//! ```text
//! 001 banner.png
//!     Source: banners/banner.png
//!     Image: 1920x1080 PNG, 2.4 MB
//!     Tier: Medium resolution
//! ```
//!
//! ## Failures
//!
//! ```text
//! 002 notes.pdf
//!     Source: banners/notes.pdf
//!     Error: Invalid file type. Please upload a PNG, JPG, WebP, or GIF image
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::metadata::format_byte_size_four_ladder;
use crate::pipeline::Analysis;
use crate::recovery::{RecoveryMetrics, format_co2_clamped};
use crate::tier;
use crate::types::{ImageMetadata, TraditionalCO2Data};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Context line at one level of indentation.
fn context(label: &str, value: impl AsRef<str>) -> String {
    format!("    {}: {}", label, value.as_ref())
}

/// Group digits in threes: `1000000` → `1,000,000`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn plural(n: u64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

/// Header plus `Source:` line shared by every report.
fn banner_header(index: usize, name: &str, source: &Path) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), name),
        context("Source", source.display().to_string()),
    ]
}

fn image_line(metadata: &ImageMetadata) -> String {
    context(
        "Image",
        format!(
            "{} {}, {}",
            metadata.resolution, metadata.format, metadata.file_size_formatted
        ),
    )
}

fn recovery_line(metrics: &RecoveryMetrics) -> String {
    match metrics {
        RecoveryMetrics::Offsets(m) => context(
            "Offsets",
            format!(
                "{}, {}, {}, {}",
                plural(m.trees_to_plant, "tree", "trees"),
                plural(m.plastic_bottles, "bottle", "bottles"),
                plural(m.bee_hotels, "bee hotel", "bee hotels"),
                plural(m.walking_weeks, "walking week", "walking weeks"),
            ),
        ),
        RecoveryMetrics::Equivalents(m) => context(
            "Equivalents",
            format!(
                "{}, {}, {:.1} km cycled, {} ocean hours",
                plural(m.trees_to_plant, "tree", "trees"),
                plural(m.plastic_bottles, "bottle", "bottles"),
                m.bike_kilometers,
                group_thousands(m.ocean_absorption_hours),
            ),
        ),
    }
}

fn traditional_line(data: &TraditionalCO2Data) -> String {
    context(
        "Traditional design",
        format!(
            "{}, {}h, {}, {}, {} ({})",
            data.complexity,
            data.design_time,
            plural(u64::from(data.revisions), "revision", "revisions"),
            plural(u64::from(data.stock_photos), "stock photo", "stock photos"),
            if data.photoshoot {
                "photoshoot"
            } else {
                "no photoshoot"
            },
            data.confidence,
        ),
    )
}

// ============================================================================
// Estimate output
// ============================================================================

/// Format the full analysis of one banner.
pub fn format_analysis(index: usize, source: &Path, analysis: &Analysis) -> Vec<String> {
    let mut lines = banner_header(index, &analysis.metadata.file_name, source);
    lines.push(image_line(&analysis.metadata));
    lines.push(context(
        "Tier",
        format!(
            "{} (baseline {})",
            analysis.tier,
            format_co2_clamped(analysis.tier_baseline_co2)
        ),
    ));

    let estimate = &analysis.estimate;
    lines.push(context(
        "AI generation",
        format!(
            "{} + {:.4}g/view ({})",
            format_co2_clamped(estimate.generation_co2),
            estimate.transmission_co2_per_view,
            estimate.confidence
        ),
    ));
    if let Some(traditional) = &analysis.traditional {
        lines.push(traditional_line(traditional));
    }

    lines.push(context(
        "Campaign",
        format!(
            "{} views, {} transferred",
            group_thousands(analysis.views),
            format_byte_size_four_ladder(analysis.campaign_transfer_bytes())
        ),
    ));
    lines.push(context("AI total", &analysis.ai_total_display));
    lines.push(context(
        "Traditional total",
        &analysis.traditional_total_display,
    ));
    if analysis.savings_co2 >= 0.0 {
        lines.push(context("Saved", format_co2_clamped(analysis.savings_co2)));
    } else {
        lines.push(context("Extra", format_co2_clamped(-analysis.savings_co2)));
    }
    lines.push(recovery_line(&analysis.recovery));
    lines
}

pub fn print_analysis(index: usize, source: &Path, analysis: &Analysis) {
    for line in format_analysis(index, source, analysis) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format validation and metadata for one banner.
pub fn format_check(index: usize, source: &Path, metadata: &ImageMetadata) -> Vec<String> {
    let mut lines = banner_header(index, &metadata.file_name, source);
    lines.push(image_line(metadata));
    lines.push(context("Tier", tier::classify(metadata).to_string()));
    lines
}

pub fn print_check(index: usize, source: &Path, metadata: &ImageMetadata) {
    for line in format_check(index, source, metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// Failures and summary
// ============================================================================

/// Format a banner that could not be processed.
pub fn format_failure(index: usize, source: &Path, error: &dyn std::error::Error) -> Vec<String> {
    let name = source
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    let mut lines = banner_header(index, &name, source);
    lines.push(context("Error", error.to_string()));
    lines
}

pub fn print_failure(index: usize, source: &Path, error: &dyn std::error::Error) {
    for line in format_failure(index, source, error) {
        println!("{}", line);
    }
}

/// Closing line for a multi-file run.
pub fn format_summary(processed: usize, failed: usize) -> String {
    let banners = if processed == 1 { "banner" } else { "banners" };
    if failed == 0 {
        format!("Processed {} {}", processed, banners)
    } else {
        format!("Processed {} {}, {} failed", processed, banners, failed)
    }
}

// ============================================================================
// Tests
// ============================================================================
