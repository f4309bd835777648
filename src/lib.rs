//! QuartzDB configuration loading.
//!
//! Resolves one or two YAML resources (a primary configuration and an
//! optional overlay), decodes them against a strict schema, and hands back a
//! single effective [`Config`] safe for concurrent use by the rest of the
//! server, or a precise, actionable error.

pub mod concurrent;
pub mod decode;
pub mod error;
pub mod loader;
pub mod merge;
pub mod resolve;
pub mod types;

pub use decode::{Decoded, ValidationReport, decode};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, LoaderSettings};
pub use merge::apply_overlay;
pub use resolve::{ResourceLocation, Resolver};
pub use types::{Config, ParameterizedClass};
