//! Android check-in protocol for OTA discovery
//!
//! The check-in endpoint answers a gzip-compressed protobuf request describing a
//! handset with a list of settings. When an update is available for the reported
//! build, the settings carry its title, description, size and download URL.
//!
//! - [`proto`]: hand-written protobuf messages for the fixed request/response schema
//! - [`hardware`]: synthetic, fingerprint-seeded hardware identity
//! - [`codec`]: request building and response classification
//! - [`client`]: HTTP transport with optional debug artifacts
//! - [`error`]: error types

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod codec;
pub mod error;
pub mod hardware;
pub mod proto;

pub use client::{CHECKIN_URL, CheckinClient, CheckinConfig, user_agent};
pub use codec::{CheckinResult, build_request, encode_request, parse_response, render_response};
pub use error::CheckinError;
pub use hardware::SyntheticHardware;
