//! Emission estimator.
//!
//! [`Estimator::estimate`] is total: it always returns a [`CO2Data`]. The
//! flow for one call is
//!
//! ```text
//! credential? ──no──────────────────────────────────────────┐
//!     │yes                                                  │
//!     ▼                                                     ▼
//! spawn service call ── timeout / error / join failure ──▶ fallback
//!     │reply
//!     ▼
//! parse::parse_generation ── no JSON / bad shape / out of range ──▶ fallback
//!     │ok
//!     ▼
//! service estimate
//! ```
//!
//! The service call runs on its own task and is raced against
//! `tokio::time::timeout`. When the timer wins the handle is dropped, which
//! detaches the task; whatever it eventually returns is discarded. There is
//! no retry.
//!
//! Failures are never surfaced to the caller. Each one is logged at `warn`
//! with its [`EstimateFailure`] and replaced by the matching formula from
//! [`fallback`], which reports `confidence: low`.

pub mod fallback;
pub mod parse;
pub mod prompt;
pub mod service;

use crate::config::EstimatorConfig;
use crate::types::{CO2Data, ImageMetadata, TraditionalCO2Data};
use parse::ParseFailure;
use service::{ChatRequest, EstimationService, OpenAiService, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a service estimate was replaced by the fallback.
#[derive(Error, Debug)]
pub enum EstimateFailure {
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("service call failed: {0}")]
    Service(#[from] ServiceError),
    #[error("service task ended abnormally: {0}")]
    Aborted(String),
    #[error("invalid reply: {0}")]
    InvalidResponse(#[from] ParseFailure),
}

/// Produces emission estimates, from the service when possible.
#[derive(Clone)]
pub struct Estimator {
    config: EstimatorConfig,
    service: Option<Arc<dyn EstimationService>>,
}

impl Estimator {
    /// Build an estimator that talks to the configured chat endpoint when a
    /// credential is present, and uses the offline formulas otherwise.
    pub fn new(config: EstimatorConfig) -> Self {
        let service = config.api_key.clone().map(|key| {
            Arc::new(OpenAiService::new(key, &config.base_url)) as Arc<dyn EstimationService>
        });
        Self { config, service }
    }

    /// Estimator that never contacts a service.
    pub fn offline(config: EstimatorConfig) -> Self {
        Self {
            config,
            service: None,
        }
    }

    /// Use `service` instead of the HTTP adapter. The credential check still
    /// applies.
    pub fn with_service(config: EstimatorConfig, service: Arc<dyn EstimationService>) -> Self {
        Self {
            config,
            service: Some(service),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Generation and per-view transmission estimate for the AI pathway.
    pub async fn estimate(&self, metadata: &ImageMetadata) -> CO2Data {
        let request = prompt::generation_request(&self.config, metadata);
        match self.ask(request, parse::parse_generation).await {
            Some(Ok(data)) => {
                log::info!(
                    "{}: service estimate {:.2}g + {:.4}g/view ({})",
                    metadata.file_name,
                    data.generation_co2,
                    data.transmission_co2_per_view,
                    data.confidence
                );
                data
            }
            Some(Err(failure)) => {
                log::warn!(
                    "{}: using fallback generation estimate: {failure}",
                    metadata.file_name
                );
                fallback::fallback_estimate(metadata)
            }
            None => fallback::fallback_estimate(metadata),
        }
    }

    /// Design-effort estimate for producing the same banner without AI.
    pub async fn estimate_traditional(&self, metadata: &ImageMetadata) -> TraditionalCO2Data {
        let request = prompt::traditional_request(&self.config, metadata);
        match self.ask(request, parse::parse_traditional).await {
            Some(Ok(data)) => {
                log::info!(
                    "{}: service traditional estimate {:.0}g ({})",
                    metadata.file_name,
                    data.design_co2,
                    data.complexity
                );
                data
            }
            Some(Err(failure)) => {
                log::warn!(
                    "{}: using fallback traditional estimate: {failure}",
                    metadata.file_name
                );
                fallback::fallback_traditional(metadata)
            }
            None => fallback::fallback_traditional(metadata),
        }
    }

    /// `None` when no service may be asked at all.
    async fn ask<T>(
        &self,
        request: ChatRequest,
        parse: fn(&str) -> Result<T, ParseFailure>,
    ) -> Option<Result<T, EstimateFailure>> {
        let service = match &self.service {
            Some(service) if self.config.has_credential() => Arc::clone(service),
            _ => {
                log::debug!("no service credential configured, using offline formulas");
                return None;
            }
        };
        let result = self
            .request_completion(service, request)
            .await
            .and_then(|reply| parse(&reply).map_err(EstimateFailure::from));
        Some(result)
    }

    async fn request_completion(
        &self,
        service: Arc<dyn EstimationService>,
        request: ChatRequest,
    ) -> Result<String, EstimateFailure> {
        let limit = self.config.timeout();
        let handle = tokio::spawn(async move { service.complete(&request).await });

        match tokio::time::timeout(limit, handle).await {
            Err(_) => Err(EstimateFailure::Timeout(limit)),
            Ok(Err(join_error)) => Err(EstimateFailure::Aborted(join_error.to_string())),
            Ok(Ok(reply)) => Ok(reply?),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::service::tests::MockService;
    use super::*;
    use crate::types::{Complexity, Confidence};

    pub(crate) fn metadata(width: u32, height: u32, file_size: u64) -> ImageMetadata {
        ImageMetadata {
            width,
            height,
            resolution: format!("{width}x{height}"),
            file_size,
            file_size_formatted: crate::metadata::format_byte_size_two_ladder(file_size),
            format: "PNG".to_string(),
            file_name: "banner.png".to_string(),
        }
    }

    /// 1920x1080 PNG of 2,500,000 bytes.
    pub(crate) fn sample_metadata() -> ImageMetadata {
        metadata(1920, 1080, 2_500_000)
    }

    fn keyed_config() -> EstimatorConfig {
        EstimatorConfig {
            api_key: Some("test-key".to_string()),
            ..EstimatorConfig::default()
        }
    }

    fn estimator_replying(reply: &str) -> (Estimator, Arc<MockService>) {
        let mock = Arc::new(MockService::replying(vec![Ok(reply.to_string())]));
        let estimator = Estimator::with_service(keyed_config(), mock.clone());
        (estimator, mock)
    }

    // =========================================================================
    // Generation estimate tests
    // =========================================================================

    #[tokio::test]
    async fn no_credential_uses_fallback_without_calling_service() {
        let mock = Arc::new(MockService::replying(vec![Ok(
            r#"{"generationCO2": 500, "transmissionCO2PerView": 0.15}"#.to_string(),
        )]));
        let estimator = Estimator::with_service(EstimatorConfig::default(), mock.clone());

        let data = estimator.estimate(&sample_metadata()).await;

        assert_eq!(data, fallback::fallback_estimate(&sample_metadata()));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn offline_estimator_uses_fallback() {
        let estimator = Estimator::offline(keyed_config());
        let data = estimator.estimate(&sample_metadata()).await;
        assert_eq!(data.generation_co2, 3.27);
        assert_eq!(data.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn valid_reply_is_used() {
        let (estimator, mock) = estimator_replying(
            r#"{"generationCO2": 500, "transmissionCO2PerView": 0.15, "confidence": "high"}"#,
        );

        let data = estimator.estimate(&sample_metadata()).await;

        assert_eq!(data.generation_co2, 500.0);
        assert_eq!(data.transmission_co2_per_view, 0.15);
        assert_eq!(data.confidence, Confidence::High);

        let requests = mock.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, prompt::TEMPERATURE);
        assert!(requests[0].messages[1].content.contains("1920x1080"));
    }

    #[tokio::test]
    async fn fenced_reply_is_used() {
        let (estimator, _) = estimator_replying(
            "```json\n{\"generationCO2\": 42.5, \"transmissionCO2PerView\": 0.02}\n```",
        );
        let data = estimator.estimate(&sample_metadata()).await;
        assert_eq!(data.generation_co2, 42.5);
        assert_eq!(data.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn out_of_range_reply_falls_back() {
        let (estimator, _) =
            estimator_replying(r#"{"generationCO2": 5000000, "transmissionCO2PerView": 0.1}"#);
        let data = estimator.estimate(&sample_metadata()).await;
        assert_eq!(data, fallback::fallback_estimate(&sample_metadata()));
    }

    #[tokio::test]
    async fn negative_reply_falls_back() {
        let (estimator, _) =
            estimator_replying(r#"{"generationCO2": 10, "transmissionCO2PerView": -0.1}"#);
        let data = estimator.estimate(&sample_metadata()).await;
        assert_eq!(data.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn malformed_reply_falls_back() {
        let (estimator, _) = estimator_replying("Sorry, I can't help with that.");
        let data = estimator.estimate(&sample_metadata()).await;
        assert_eq!(data, fallback::fallback_estimate(&sample_metadata()));
    }

    #[tokio::test]
    async fn service_error_falls_back() {
        let mock = Arc::new(MockService::replying(vec![Err(ServiceError::Status(503))]));
        let estimator = Estimator::with_service(keyed_config(), mock.clone());

        let data = estimator.estimate(&sample_metadata()).await;

        assert_eq!(data.confidence, Confidence::Low);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out_to_fallback() {
        let mock = Arc::new(MockService::slow(
            Duration::from_secs(60),
            r#"{"generationCO2": 500, "transmissionCO2PerView": 0.15}"#,
        ));
        let estimator = Estimator::with_service(keyed_config(), mock);

        let data = estimator.estimate(&sample_metadata()).await;

        assert_eq!(data, fallback::fallback_estimate(&sample_metadata()));
    }

    #[tokio::test(start_paused = true)]
    async fn reply_inside_timeout_is_used() {
        let mock = Arc::new(MockService::slow(
            Duration::from_secs(5),
            r#"{"generationCO2": 500, "transmissionCO2PerView": 0.15}"#,
        ));
        let estimator = Estimator::with_service(keyed_config(), mock);

        let data = estimator.estimate(&sample_metadata()).await;

        assert_eq!(data.generation_co2, 500.0);
    }

    #[tokio::test]
    async fn request_completion_reports_service_failure() {
        let estimator = Estimator::offline(keyed_config());
        let mock = Arc::new(MockService::replying(vec![Err(ServiceError::EmptyChoices)]));
        let request = prompt::generation_request(estimator.config(), &sample_metadata());

        let result = estimator.request_completion(mock, request).await;

        assert!(matches!(result, Err(EstimateFailure::Service(_))));
    }

    // =========================================================================
    // Traditional estimate tests
    // =========================================================================

    #[tokio::test]
    async fn traditional_without_credential_uses_fallback() {
        let estimator = Estimator::offline(EstimatorConfig::default());
        let data = estimator.estimate_traditional(&sample_metadata()).await;
        assert_eq!(data, fallback::fallback_traditional(&sample_metadata()));
    }

    #[tokio::test]
    async fn traditional_valid_reply_is_used() {
        let (estimator, mock) = estimator_replying(
            r#"{"designCO2": 3000, "designTime": 5, "revisions": 2, "stockPhotos": 2,
                "photoshoot": false, "complexity": "Standard", "confidence": "medium"}"#,
        );

        let data = estimator.estimate_traditional(&sample_metadata()).await;

        assert_eq!(data.design_co2, 3000.0);
        assert_eq!(data.complexity, Complexity::Standard);
        let requests = mock.requests.lock().unwrap();
        assert!(requests[0].messages[1].content.contains("designCO2"));
    }

    #[tokio::test]
    async fn traditional_invalid_reply_falls_back() {
        let (estimator, _) = estimator_replying(r#"{"designCO2": 3000}"#);
        let data = estimator.estimate_traditional(&sample_metadata()).await;
        assert_eq!(data.confidence, Confidence::Low);
        assert_eq!(data.complexity, Complexity::Premium);
    }
}
