//! Synheart Digest - Deterministic slimming engine for wearable records
//!
//! Digest turns verbose wearable-provider records into compact, bounded-size
//! summaries that a text-based analysis step can read in one pass: provider
//! adaptation → per-metric slimming → compact document encoding.
//!
//! ## Modules
//!
//! - **Primitives**: percentile and series statistics, timeline compression,
//!   per-day record selection
//! - **Slimmers**: one per metric type (heart rate, stress, body battery,
//!   training readiness, HRV, sleep, activity)
//! - **Pipeline**: document in, digest document out

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod selector;
pub mod slimmers;
pub mod stats;
pub mod timeline;
pub mod timestamp;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{CollectionWindow, DigestConfig, MetricConfig, Preset};
pub use encoder::{DigestDocument, DigestEncoder, OutputStyle};
pub use error::DigestError;
pub use pipeline::{garmin_to_digest, slim_document, Digest, DigestProcessor, MetricReport};
pub use types::{MetricKind, PickPolicy};

/// Library version
pub const DIGEST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and embedding hosts
pub const PRODUCER_NAME: &str = "synheart-digest";
