//! Parsing and validation of service replies.
//!
//! The service answers in free text that should contain one JSON object,
//! possibly wrapped in a markdown code fence:
//!
//! ````text
//! ```json
//! {"generationCO2": 12.5, "transmissionCO2PerView": 0.2}
//! ```
//! ````
//!
//! [`extract_json_object`] strips the fence and slices from the first `{` to
//! the last `}`. The object is then deserialized into a loose shape and every
//! numeric field is checked against the bounds in [`crate::types`]. Anything
//! missing, mistyped, non-finite, negative or oversized is a
//! [`ParseFailure`], which the estimator answers with its fallback.

use crate::types::{CO2Data, Complexity, Confidence, ModelInfo, TraditionalCO2Data};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseFailure {
    #[error("reply contains no JSON object")]
    NoJsonObject,
    #[error("reply JSON does not match the expected shape: {0}")]
    Shape(String),
    #[error("{field} = {value} is not a whole number of at least zero")]
    InvalidCount { field: &'static str, value: f64 },
    #[error("{field} = {value} is outside 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        max: f64,
    },
}

/// Strip an optional markdown fence and return the outermost `{...}` span.
///
/// The fence may sit on the same line as the JSON (```` ```json {...}``` ````)
/// or on its own lines.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Info string (`json`, `JSON`, ...) if any, then the body.
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        body = body.trim();
        body = body.strip_suffix("```").unwrap_or(body);
    }
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

#[derive(Deserialize)]
struct RawGeneration {
    #[serde(rename = "generationCO2")]
    generation_co2: f64,
    #[serde(rename = "transmissionCO2PerView")]
    transmission_co2_per_view: f64,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(rename = "modelInfo", default)]
    model_info: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct RawTraditional {
    #[serde(rename = "designCO2")]
    design_co2: f64,
    #[serde(rename = "designTime")]
    design_time: f64,
    revisions: f64,
    #[serde(rename = "stockPhotos")]
    stock_photos: f64,
    photoshoot: bool,
    complexity: String,
    #[serde(default)]
    confidence: Option<String>,
}

fn whole_count(field: &'static str, value: f64) -> Result<u32, ParseFailure> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(ParseFailure::InvalidCount { field, value })
    }
}

fn out_of_range((field, value, max): (&'static str, f64, f64)) -> ParseFailure {
    ParseFailure::OutOfRange { field, value, max }
}

fn parse_confidence(raw: Option<&str>) -> Confidence {
    raw.and_then(|c| c.parse().ok()).unwrap_or_default()
}

fn stringify_model_info(map: Map<String, Value>) -> ModelInfo {
    map.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

fn deserialize<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, ParseFailure> {
    let json = extract_json_object(text).ok_or(ParseFailure::NoJsonObject)?;
    serde_json::from_str(json).map_err(|e| ParseFailure::Shape(e.to_string()))
}

/// Parse and validate a generation estimate reply.
pub fn parse_generation(text: &str) -> Result<CO2Data, ParseFailure> {
    let raw: RawGeneration = deserialize(text)?;
    let data = CO2Data {
        generation_co2: raw.generation_co2,
        transmission_co2_per_view: raw.transmission_co2_per_view,
        confidence: parse_confidence(raw.confidence.as_deref()),
        model_info: raw.model_info.map(stringify_model_info),
    };
    match data.out_of_bounds() {
        Some(violation) => Err(out_of_range(violation)),
        None => Ok(data),
    }
}

/// Parse and validate a traditional-design estimate reply.
///
/// Counts may arrive as `2` or `2.0`; complexity names match in any case.
pub fn parse_traditional(text: &str) -> Result<TraditionalCO2Data, ParseFailure> {
    let raw: RawTraditional = deserialize(text)?;
    let complexity: Complexity = raw.complexity.parse().map_err(ParseFailure::Shape)?;
    let data = TraditionalCO2Data {
        design_co2: raw.design_co2,
        design_time: raw.design_time,
        revisions: whole_count("revisions", raw.revisions)?,
        stock_photos: whole_count("stockPhotos", raw.stock_photos)?,
        photoshoot: raw.photoshoot,
        complexity,
        confidence: parse_confidence(raw.confidence.as_deref()),
    };
    match data.out_of_bounds() {
        Some(violation) => Err(out_of_range(violation)),
        None => Ok(data),
    }
}
