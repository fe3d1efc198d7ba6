//! Per-scan check evaluation
//!
//! A [`Check`] is created for one (application, check) pair at the start of
//! a scan. Collectors feed it observations, then [`Check::calc`] decides the
//! status and renders the message. A check is owned by a single scan task.

mod context;
mod template;

pub use context::{plural, plural_word, CheckContext};
pub use template::{Template, TemplateHelpers};

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::TemplateError;
use crate::models::{ApplicationCategory, ApplicationId, Status, TimeSeries};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::overrides::CheckConfigs;
use crate::registry::{self, CheckDefinition, CheckKind, ConfigShape};
use crate::units::Unit;

const LOG: StructuredLogger = StructuredLogger::new("evaluator");

/// Evaluation state and result of one check
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub id: &'static str,
    pub title: &'static str,
    pub status: Status,
    pub message: String,
    pub threshold: f32,
    pub unit: Unit,
    pub condition_format_template: &'static str,

    #[serde(skip)]
    kind: CheckKind,
    #[serde(skip)]
    message_template: &'static str,
    #[serde(skip)]
    items: BTreeSet<String>,
    #[serde(skip)]
    count: i64,
    #[serde(skip)]
    desired: i64,
    #[serde(skip)]
    value: f32,
    #[serde(skip)]
    values: Option<TimeSeries>,
    #[serde(skip)]
    fired: bool,
    #[serde(skip)]
    evaluated: bool,
}

impl Check {
    /// Fresh check in the `Ok` state using the given threshold
    pub fn new(definition: &CheckDefinition, threshold: f32) -> Self {
        Self {
            id: definition.id,
            title: definition.title,
            status: Status::Ok,
            message: String::new(),
            threshold,
            unit: definition.unit,
            condition_format_template: definition.condition_template,
            kind: definition.kind,
            message_template: definition.message_template,
            items: BTreeSet::new(),
            count: 0,
            desired: 0,
            value: 0.0,
            values: None,
            fired: false,
            evaluated: false,
        }
    }

    /// Check with the threshold resolved for `app`; `None` for unknown ids
    pub fn resolve(check_id: &str, configs: &CheckConfigs, app: &ApplicationId) -> Option<Self> {
        let Some(definition) = registry::lookup(check_id) else {
            LOG.log_unknown_check(check_id);
            EngineMetrics::new().inc_unknown_check_lookups();
            return None;
        };
        let threshold = match definition.config_shape {
            ConfigShape::Simple => configs.get_simple(check_id, app).threshold,
            ConfigShape::SloAvailability => configs.get_availability(app).0.objective_percentage,
            ConfigShape::SloLatency => {
                configs
                    .get_latency(app, &ApplicationCategory::default())
                    .0
                    .objective_percentage
            }
        };
        Some(Self::new(definition, threshold))
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    /// Record a distinct affected item
    pub fn add_item(&mut self, item: impl Into<String>) {
        self.items.insert(item.into());
    }

    pub fn items(&self) -> &BTreeSet<String> {
        &self.items
    }

    pub fn inc(&mut self, amount: i64) {
        self.count += amount;
    }

    pub fn reset_counter(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn set_desired(&mut self, desired: i64) {
        self.desired = desired;
    }

    pub fn desired(&self) -> i64 {
        self.desired
    }

    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_values(&mut self, values: TimeSeries) {
        self.values = Some(values);
    }

    pub fn values(&self) -> Option<&TimeSeries> {
        self.values.as_ref()
    }

    /// Mark a manual check as firing
    pub fn fire(&mut self) {
        self.fired = true;
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn set_status(&mut self, status: Status, message: impl Into<String>) {
        self.status = status;
        self.message = message.into();
    }

    /// Decide the status from the accumulated observations.
    ///
    /// Runs once per check; later calls keep the first result.
    pub fn calc(&mut self) {
        if self.evaluated {
            return;
        }
        self.evaluated = true;

        if self.should_fire() {
            match self.render_message() {
                Ok(message) => self.set_status(Status::Warning, message),
                Err(RenderError::Parse(e)) => {
                    self.set_status(Status::Unknown, format!("invalid template: {}", e))
                }
                Err(RenderError::Execute(e)) => {
                    self.set_status(Status::Unknown, format!("failed to render message: {}", e))
                }
            }
        }

        LOG.log_check_evaluated(self.id, self.status, &self.message);
        EngineMetrics::new().inc_checks_evaluated(self.status);
    }

    fn should_fire(&self) -> bool {
        match self.kind {
            CheckKind::EventBased => self.count > self.threshold as i64,
            // The collector only records items that already exceed the threshold.
            CheckKind::ItemBased => !self.items.is_empty(),
            CheckKind::ValueBased => self.value > self.threshold,
            CheckKind::Manual => self.fired,
        }
    }

    fn render_message(&self) -> Result<String, RenderError> {
        let template = Template::parse(self.message_template).map_err(RenderError::Parse)?;
        let ctx = CheckContext {
            items: &self.items,
            count: self.count,
            value: self.value,
            unit: self.unit,
        };
        template.render(&ctx).map_err(RenderError::Execute)
    }
}

enum RenderError {
    Parse(TemplateError),
    Execute(TemplateError),
}
