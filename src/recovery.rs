//! Aggregation, offset equivalents, and CO2 display formatting.
//!
//! ## Totals
//!
//! [`total_co2`] adds per-view transmission over a campaign's view count to
//! the one-off generation cost. The result is left unrounded; display
//! rounding belongs to [`format_co2`].
//!
//! ## Recovery metrics
//!
//! Two metric sets exist and are never mixed. Both share trees and plastic
//! bottles; they differ in the remaining pair:
//!
//! | Set | Extra metrics |
//! |---|---|
//! | [`MetricSet::Offsets`] → [`RecoveryMetricsV1`] | bee hotels, walking weeks |
//! | [`MetricSet::Equivalents`] → [`RecoveryMetricsV2`] | bike kilometers, ocean absorption hours |
//!
//! Every conversion is a non-decreasing function of the input kilograms.
//!
//! ## Formatting
//!
//! [`format_co2`] is strict and rejects negative or non-finite input. [`format_co2_clamped`]
//! maps NaN, infinities and negatives to zero and never fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kilograms of CO2 a tree absorbs per year.
pub const KG_PER_TREE: f64 = 21.0;
/// Kilograms of CO2 saved by recycling one plastic bottle.
pub const KG_PER_BOTTLE: f64 = 0.03;
/// Kilograms of CO2 offset by one bee hotel.
pub const KG_PER_BEE_HOTEL: f64 = 5.0;
/// Kilograms of CO2 saved per week of walking instead of driving.
pub const KG_PER_WALKING_WEEK: f64 = 2.0;
/// Kilograms of CO2 per car kilometer replaced by cycling.
pub const KG_PER_BIKE_KM: f64 = 0.21;
/// Kilograms of CO2 the reference ocean patch absorbs per hour.
pub const KG_PER_OCEAN_HOUR: f64 = 0.0001;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid argument: {name} must be a finite number of at least zero, got {value}")]
pub struct InvalidArgument {
    pub name: &'static str,
    pub value: f64,
}

fn require_non_negative(name: &'static str, value: f64) -> Result<f64, InvalidArgument> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidArgument { name, value });
    }
    Ok(value)
}

/// Total grams over a campaign: `generation + per_view × views`.
pub fn total_co2(
    generation_co2: f64,
    transmission_co2_per_view: f64,
    view_count: f64,
) -> Result<f64, InvalidArgument> {
    let generation = require_non_negative("generation_co2", generation_co2)?;
    let per_view = require_non_negative("transmission_co2_per_view", transmission_co2_per_view)?;
    let views = require_non_negative("view_count", view_count)?;
    Ok(generation + per_view * views)
}

/// Which recovery metric set a call site displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSet {
    /// Trees, bottles, bee hotels, walking weeks.
    #[default]
    Offsets,
    /// Trees, bottles, bike kilometers, ocean absorption hours.
    Equivalents,
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSet::Offsets => f.write_str("offsets"),
            MetricSet::Equivalents => f.write_str("equivalents"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMetricsV1 {
    pub trees_to_plant: u64,
    pub plastic_bottles: u64,
    pub bee_hotels: u64,
    pub walking_weeks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMetricsV2 {
    pub trees_to_plant: u64,
    pub plastic_bottles: u64,
    /// One decimal place.
    pub bike_kilometers: f64,
    pub ocean_absorption_hours: u64,
}

/// Recovery metrics tagged with the set they were computed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "set", rename_all = "lowercase")]
pub enum RecoveryMetrics {
    Offsets(RecoveryMetricsV1),
    Equivalents(RecoveryMetricsV2),
}

fn ceil_count(kg: f64, per_unit: f64) -> u64 {
    (kg / per_unit).ceil() as u64
}

pub fn recovery_metrics_v1(total_co2_kg: f64) -> Result<RecoveryMetricsV1, InvalidArgument> {
    let kg = require_non_negative("total_co2_kg", total_co2_kg)?;
    Ok(RecoveryMetricsV1 {
        trees_to_plant: ceil_count(kg, KG_PER_TREE),
        plastic_bottles: ceil_count(kg, KG_PER_BOTTLE),
        bee_hotels: ceil_count(kg, KG_PER_BEE_HOTEL),
        walking_weeks: ceil_count(kg, KG_PER_WALKING_WEEK),
    })
}

pub fn recovery_metrics_v2(total_co2_kg: f64) -> Result<RecoveryMetricsV2, InvalidArgument> {
    let kg = require_non_negative("total_co2_kg", total_co2_kg)?;
    Ok(RecoveryMetricsV2 {
        trees_to_plant: ceil_count(kg, KG_PER_TREE),
        plastic_bottles: ceil_count(kg, KG_PER_BOTTLE),
        bike_kilometers: (kg / KG_PER_BIKE_KM * 10.0).round() / 10.0,
        ocean_absorption_hours: (kg / KG_PER_OCEAN_HOUR).round() as u64,
    })
}

/// Compute the metrics of one set for a total in kilograms.
pub fn recovery_metrics(
    total_co2_kg: f64,
    set: MetricSet,
) -> Result<RecoveryMetrics, InvalidArgument> {
    match set {
        MetricSet::Offsets => recovery_metrics_v1(total_co2_kg).map(RecoveryMetrics::Offsets),
        MetricSet::Equivalents => {
            recovery_metrics_v2(total_co2_kg).map(RecoveryMetrics::Equivalents)
        }
    }
}

/// Format grams for display, rejecting negative, NaN or infinite input.
///
/// ```text
/// 999    → "999g"
/// 1000   → "1.00kg"
/// 9999   → "10.00kg"
/// 99999  → "100kg"
/// 150500 → "151kg"
/// ```
pub fn format_co2(grams: f64) -> Result<String, InvalidArgument> {
    let grams = require_non_negative("grams", grams)?;
    Ok(render_grams(grams))
}

/// Format grams for display, treating NaN, infinities and negatives as zero.
pub fn format_co2_clamped(grams: f64) -> String {
    let grams = if grams.is_finite() && grams > 0.0 {
        grams
    } else {
        0.0
    };
    render_grams(grams)
}

fn render_grams(grams: f64) -> String {
    if grams < 1000.0 {
        return format!("{}g", grams.round() as u64);
    }

    let kg = grams / 1000.0;
    if kg < 10.0 {
        format!("{kg:.2}kg")
    } else if kg < 100.0 {
        let one_decimal = (kg * 10.0).round() / 10.0;
        if one_decimal >= 100.0 {
            format!("{}kg", one_decimal.round() as u64)
        } else {
            format!("{one_decimal:.1}kg")
        }
    } else {
        format!("{}kg", kg.round() as u64)
    }
}
