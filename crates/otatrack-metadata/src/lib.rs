//! Streaming OTA metadata extraction
//!
//! OTA packages are multi-gigabyte ZIP archives, but the build identity of the
//! target release sits in a small entry near the front: `META-INF/com/android/metadata`.
//! This crate pulls that entry out of the download as it streams, without buffering
//! the archive, and stops the transfer as soon as the wanted keys have been seen.
//!
//! The pipeline is a chain of push-based [`Stage`]s:
//!
//! 1. fetch: rate-limited HTTP body reader ([`fetch`])
//! 2. archive: local-file-header walker that emits one entry's bytes ([`archive`])
//! 3. filter: line matcher with a match ceiling ([`filter`])
//!
//! [`MetadataExtractor`] drives the chain under an overall deadline and turns the
//! matched lines into [`OtaMetadata`].

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod archive;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod filter;
pub mod metadata;
pub mod stage;

pub use archive::{METADATA_ENTRY, ZipEntryStage};
pub use error::ExtractError;
pub use extractor::{ExtractorConfig, MetadataExtractor};
pub use filter::LineFilterStage;
pub use metadata::{
    OtaMetadata, SdkSummary, android_version_for_sdk, build_date_from_timestamp,
    incremental_from_fingerprint,
};
pub use stage::{Flow, Pipeline, Stage};
