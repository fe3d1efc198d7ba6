//! Per-application check configuration overrides
//!
//! Overrides are stored per selector (exact application, glob pattern or the
//! platform-wide scope) and resolved in that order of precedence before the
//! registry default applies.

mod config;
mod selector;
mod store;

#[cfg(test)]
mod tests;

pub use config::{
    decode, decode_payload, ConfigSource, RawPayload, ResolvedConfig, SimpleThreshold,
    SloAvailabilityConfig, SloLatencyConfig,
};
pub use selector::{glob_match, ApplicationSelector, GlobPattern};
pub use store::{CheckConfigs, OverrideStore, Resolution, Tier};
