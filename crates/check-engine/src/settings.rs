//! Engine settings
//!
//! Defaults applied when an SLO check has no explicit override.

use serde::{Deserialize, Serialize};

/// Default latency objectives by application category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SloSettings {
    /// Objective bucket in seconds for primary applications
    #[serde(default = "default_objective_bucket")]
    pub objective_bucket: f32,

    /// Objective bucket in seconds for auxiliary (control-plane, monitoring) applications
    #[serde(default = "default_auxiliary_objective_bucket")]
    pub auxiliary_objective_bucket: f32,
}

fn default_objective_bucket() -> f32 {
    0.5
}

fn default_auxiliary_objective_bucket() -> f32 {
    5.0
}

impl Default for SloSettings {
    fn default() -> Self {
        Self {
            objective_bucket: default_objective_bucket(),
            auxiliary_objective_bucket: default_auxiliary_objective_bucket(),
        }
    }
}

impl SloSettings {
    pub fn objective_bucket_for(&self, auxiliary: bool) -> f32 {
        if auxiliary {
            self.auxiliary_objective_bucket
        } else {
            self.objective_bucket
        }
    }
}
