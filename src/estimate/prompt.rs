//! Request templates for the estimation service.
//!
//! Both prompts embed the banner's resolution, byte size and format, plus the
//! fixed context strings from [`EstimatorConfig`]. The context strings only
//! steer the model; no calculation here reads them.

use super::service::{ChatMessage, ChatRequest};
use crate::config::EstimatorConfig;
use crate::types::ImageMetadata;

/// Sampling temperature for every estimation request.
pub const TEMPERATURE: f32 = 0.3;

const GENERATION_SYSTEM: &str = "You are an expert in the energy use and carbon footprint of \
generative AI and digital advertising. Answer with a single JSON object and nothing else.";

const TRADITIONAL_SYSTEM: &str = "You are an expert in the carbon footprint of creative agency \
work: designer time, revision rounds, stock photography and photoshoots. Answer with a single \
JSON object and nothing else.";

/// Request for the AI generation estimate.
pub fn generation_request(config: &EstimatorConfig, metadata: &ImageMetadata) -> ChatRequest {
    let user = format!(
        "Estimate the carbon footprint of an AI-generated ad banner.\n\
         \n\
         Image:\n\
         - Resolution: {resolution}\n\
         - File size: {bytes} bytes\n\
         - Format: {format}\n\
         \n\
         Context:\n\
         - Generation system: {profile}\n\
         - Location: {location}\n\
         \n\
         Respond with JSON in exactly this shape:\n\
         {{\"generationCO2\": <grams of CO2 to generate the image>, \
         \"transmissionCO2PerView\": <grams of CO2 to deliver it once>, \
         \"confidence\": \"high\" | \"medium\" | \"low\", \
         \"modelInfo\": {{\"method\": <short description>}}}}",
        resolution = metadata.resolution,
        bytes = metadata.file_size,
        format = metadata.format,
        profile = config.system_profile,
        location = config.location,
    );

    ChatRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage::system(GENERATION_SYSTEM), ChatMessage::user(user)],
        temperature: TEMPERATURE,
    }
}

/// Request for the traditional-design estimate.
pub fn traditional_request(config: &EstimatorConfig, metadata: &ImageMetadata) -> ChatRequest {
    let user = format!(
        "Estimate the carbon footprint of a human design team producing this ad banner \
         without AI.\n\
         \n\
         Image:\n\
         - Resolution: {resolution}\n\
         - File size: {bytes} bytes\n\
         - Format: {format}\n\
         \n\
         Context:\n\
         - Location: {location}\n\
         \n\
         Respond with JSON in exactly this shape:\n\
         {{\"designCO2\": <grams of CO2>, \"designTime\": <hours>, \
         \"revisions\": <integer>, \"stockPhotos\": <integer>, \"photoshoot\": <boolean>, \
         \"complexity\": \"Basic\" | \"Standard\" | \"Premium\" | \"Enterprise\", \
         \"confidence\": \"high\" | \"medium\" | \"low\"}}",
        resolution = metadata.resolution,
        bytes = metadata.file_size,
        format = metadata.format,
        location = config.location,
    );

    ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(TRADITIONAL_SYSTEM),
            ChatMessage::user(user),
        ],
        temperature: TEMPERATURE,
    }
}
