//! Device identities for OTA tracking
//!
//! A tracked handset is described by a small YAML document holding the values the
//! check-in endpoint needs to recognise it: OEM, product, device codename, platform
//! version, build tag and the currently installed incremental. A document may also
//! carry a `variants` list; every entry inherits the base fields and overrides
//! whatever it sets itself, producing one [`DeviceIdentity`] per variant.
//!
//! - [`identity`]: the identity record and its canonical fingerprint
//! - [`document`]: YAML loading, variant expansion and validation
//! - [`region`]: product-suffix region codes and their display names
//! - [`error`]: error types

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod document;
pub mod error;
pub mod identity;
pub mod region;

pub use document::{REQUIRED_FIELDS, load_identities, parse_identities, select_region};
pub use error::DeviceConfigError;
pub use identity::DeviceIdentity;
pub use region::{region_code, region_for_product, region_name};
