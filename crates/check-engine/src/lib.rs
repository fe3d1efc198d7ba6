//! Check configuration and evaluation engine
//!
//! This crate provides the core functionality for:
//! - The registry of built-in health checks
//! - Per-application threshold and SLO overrides
//! - Resolving the effective configuration for an application
//! - Evaluating a check for one scan and rendering its message

pub mod error;
pub mod evaluator;
pub mod models;
pub mod observability;
pub mod overrides;
pub mod registry;
pub mod settings;
pub mod units;

pub use error::{CheckError, Result, TemplateError};
pub use evaluator::Check;
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use overrides::{
    ApplicationSelector, CheckConfigs, OverrideStore, Resolution, ResolvedConfig, SimpleThreshold,
    SloAvailabilityConfig, SloLatencyConfig, Tier,
};
pub use registry::{CheckDefinition, CheckKind, CheckRegistry, ConfigShape};
pub use settings::SloSettings;
pub use units::Unit;
