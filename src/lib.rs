//! # Banner Carbon
//!
//! Carbon footprint estimates for ad-banner images. A banner is compared on
//! two pathways: generating it with an AI model, and producing it the
//! traditional way with designer time, revision rounds, stock photos and
//! perhaps a photoshoot. The result is converted into offset figures (trees
//! to plant, bottles to recycle, ...) for display.
//!
//! # Architecture: One Stateless Pipeline
//!
//! ```text
//! 1. Validate   upload    →  ok / ValidationError     (type, size, emptiness)
//! 2. Extract    upload    →  ImageMetadata            (container header only)
//! 3. Estimate   metadata  →  CO2Data                  (service or fallback, never fails)
//! 4. Classify   metadata  →  ResolutionTier           (memoized traditional baseline)
//! 5. Aggregate  estimates →  totals + recovery metrics + display strings
//! ```
//!
//! Stages 1 and 2 are the only ones that can reject an upload. Stage 3 is a
//! total function: any trouble with the external service is logged and
//! replaced by a deterministic formula. Nothing is persisted and no state
//! survives between calls.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Upload gate: MIME type or extension, size cap, emptiness |
//! | [`metadata`] | Dimension probing, format normalization, byte-size formatting |
//! | [`imaging`] | `ImageBackend` trait and the `image`-crate implementation |
//! | [`estimate`] | Emission estimator: service port, prompts, reply parsing, fallback formulas |
//! | [`tier`] | Resolution tiers and the synthetic traditional-cost model |
//! | [`recovery`] | Campaign totals, recovery metric sets, CO2 display formatting |
//! | [`pipeline`] | Orchestration of all stages into an [`pipeline::Analysis`] |
//! | [`config`] | `banner-carbon.toml` loading, merging, validation, environment overlay |
//! | [`types`] | Value types shared by every stage |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Metadata, Never Pixels
//!
//! Only the container header is read: width, height, byte size and format.
//! The `image` crate's `into_dimensions` answers from the header without
//! decoding pixel data, which keeps large uploads cheap and means nothing
//! about the picture's content ever enters an estimate.
//!
//! ## The Service Is a Port
//!
//! The estimator talks to an [`estimate::service::EstimationService`] trait
//! object. Production uses a chat-completions adapter over `reqwest`; tests
//! plug in a scripted mock. The fallback and validation logic therefore runs
//! without network access.
//!
//! ## One Attempt, Then Fallback
//!
//! Each estimate makes at most one request, raced against a timeout. A
//! missing credential, a transport error, a slow answer, malformed JSON or an
//! implausible number all lead to the same place: the offline formula with
//! `confidence: low`. Callers never see an estimation error.
//!
//! ## Two Recovery Metric Sets
//!
//! [`recovery::MetricSet::Offsets`] and [`recovery::MetricSet::Equivalents`]
//! share trees and bottles but differ in the remaining pair. Results are
//! tagged with their set so the two are never mixed in one display.

pub mod config;
pub mod estimate;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod recovery;
pub mod tier;
pub mod types;
pub mod validate;
