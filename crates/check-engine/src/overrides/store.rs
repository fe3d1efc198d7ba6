//! Override document, precedence resolution and typed accessors

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::config::{
    decode_payload, RawPayload, ResolvedConfig, SimpleThreshold, SloAvailabilityConfig,
    SloLatencyConfig,
};
use super::selector::ApplicationSelector;
use crate::error::{CheckError, Result};
use crate::models::{ApplicationCategory, ApplicationId, ApplicationKind};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::registry::{self, ids, CheckDefinition};
use crate::settings::SloSettings;

const LOG: StructuredLogger = StructuredLogger::new("resolver");

/// Precedence tier an override was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Keyed by the application's own id
    Application,
    /// Keyed by a glob (or another id string) matching the application
    Pattern,
    /// Keyed by the platform-wide selector
    Global,
    /// No override; the registry default applies
    Builtin,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Application => "application",
            Tier::Pattern => "pattern",
            Tier::Global => "global",
            Tier::Builtin => "builtin",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw result of walking the precedence tiers for one check
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub payload: Option<&'a RawPayload>,
    pub selector: Option<&'a ApplicationSelector>,
    pub tier: Tier,
}

impl Resolution<'_> {
    fn builtin() -> Self {
        Self {
            payload: None,
            selector: None,
            tier: Tier::Builtin,
        }
    }

    /// True only when the platform-wide override supplied the payload
    pub fn is_global_default(&self) -> bool {
        self.tier == Tier::Global
    }

    /// True when no override applied at all
    pub fn used_builtin(&self) -> bool {
        self.tier == Tier::Builtin
    }

    fn selector_label(&self) -> String {
        self.selector.map(|s| s.to_string()).unwrap_or_default()
    }
}

/// Per-selector, per-check override payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckConfigs {
    entries: BTreeMap<ApplicationSelector, BTreeMap<String, RawPayload>>,
}

impl CheckConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }

    /// Store a raw payload, replacing any previous one
    pub fn insert_raw(
        &mut self,
        selector: ApplicationSelector,
        check_id: impl Into<String>,
        payload: RawPayload,
    ) -> Option<RawPayload> {
        self.entries
            .entry(selector)
            .or_default()
            .insert(check_id.into(), payload)
    }

    /// Encode a typed configuration and store it
    pub fn set<T: Serialize>(
        &mut self,
        selector: ApplicationSelector,
        check_id: &str,
        config: &T,
    ) -> Result<()> {
        let json = serde_json::to_string(config).map_err(|source| CheckError::Encode {
            check: check_id.to_string(),
            source,
        })?;
        self.insert_raw(selector, check_id, RawPayload::new(json));
        Ok(())
    }

    pub fn remove(&mut self, selector: &ApplicationSelector, check_id: &str) -> Option<RawPayload> {
        let checks = self.entries.get_mut(selector)?;
        let removed = checks.remove(check_id);
        if checks.is_empty() {
            self.entries.remove(selector);
        }
        removed
    }

    pub fn get_raw(&self, selector: &ApplicationSelector, check_id: &str) -> Option<&RawPayload> {
        self.entries.get(selector)?.get(check_id)
    }

    /// Selectors with at least one override, in sorted order
    pub fn selectors(&self) -> impl Iterator<Item = &ApplicationSelector> {
        self.entries.keys()
    }

    /// Walk the precedence tiers for one application and check.
    ///
    /// Exact id first, then every other non-global selector whose string form
    /// glob-matches the application (sorted order, first match wins), then the
    /// global selector. The zero application's own key is the global
    /// selector, so a hit there is its application tier, not a global default.
    pub fn resolve(&self, app: &ApplicationId, check_id: &str) -> Resolution<'_> {
        let own = ApplicationSelector::from(app.clone());
        if let Some(resolution) = self.resolution_at(&own, check_id, Tier::Application) {
            return resolution;
        }
        if app.is_zero() {
            return Resolution::builtin();
        }

        let app_str = app.to_string();
        let matched = self
            .entries
            .iter()
            .filter(|(selector, _)| !selector.is_global() && **selector != own)
            .filter(|(selector, _)| selector.matches(&app_str))
            .find_map(|(selector, checks)| checks.get(check_id).map(|p| (selector, p)));
        if let Some((selector, payload)) = matched {
            return Resolution {
                payload: Some(payload),
                selector: Some(selector),
                tier: Tier::Pattern,
            };
        }

        self.resolution_at(&ApplicationSelector::Global, check_id, Tier::Global)
            .unwrap_or_else(Resolution::builtin)
    }

    fn resolution_at(
        &self,
        selector: &ApplicationSelector,
        check_id: &str,
        tier: Tier,
    ) -> Option<Resolution<'_>> {
        let (selector, checks) = self.entries.get_key_value(selector)?;
        checks.get(check_id).map(|payload| Resolution {
            payload: Some(payload),
            selector: Some(selector),
            tier,
        })
    }

    /// Effective single-threshold config of a check for an application.
    ///
    /// Undecodable payloads fall back to the registry default.
    pub fn get_simple(&self, check_id: &str, app: &ApplicationId) -> SimpleThreshold {
        let Some(definition) = definition(check_id) else {
            return SimpleThreshold::default();
        };
        let default = SimpleThreshold::new(definition.default_threshold);
        let resolution = self.resolve(app, check_id);
        LOG.log_resolution(app, check_id, resolution.tier.as_str());
        let Some(raw) = resolution.payload else {
            return default;
        };
        match raw.decode::<SimpleThreshold>() {
            Ok(cfg) => cfg,
            Err(e) => {
                decode_failed(check_id, &resolution.selector_label(), &e);
                default
            }
        }
    }

    /// Builtin, global and (for non-zero apps) app-specific thresholds.
    ///
    /// The first element is always the registry default; missing or
    /// undecodable overrides are `None`. Unknown checks yield an empty list.
    pub fn get_simple_all(&self, check_id: &str, app: &ApplicationId) -> Vec<Option<SimpleThreshold>> {
        let Some(definition) = definition(check_id) else {
            return Vec::new();
        };
        let mut res = vec![Some(SimpleThreshold::new(definition.default_threshold))];
        let mut selectors = vec![ApplicationSelector::Global];
        if !app.is_zero() {
            selectors.push(ApplicationSelector::App(app.clone()));
        }
        for selector in selectors {
            let cfg = self.get_raw(&selector, check_id).and_then(|raw| {
                raw.decode::<SimpleThreshold>()
                    .map_err(|e| decode_failed(check_id, &selector.to_string(), &e))
                    .ok()
            });
            res.push(cfg);
        }
        res
    }

    /// Every stored override of one check, decoded into its declared shape
    pub fn by_check(&self, check_id: &str) -> BTreeMap<ApplicationSelector, Vec<ResolvedConfig>> {
        let mut res = BTreeMap::new();
        let Some(definition) = definition(check_id) else {
            return res;
        };
        for (selector, checks) in &self.entries {
            let Some(raw) = checks.get(check_id) else {
                continue;
            };
            match decode_payload(definition, raw) {
                Ok(configs) => {
                    res.insert(selector.clone(), configs);
                }
                Err(e) => decode_failed(check_id, &selector.to_string(), &e),
            }
        }
        res
    }

    /// Availability SLO of an application and whether the default was used
    pub fn get_availability(&self, app: &ApplicationId) -> (SloAvailabilityConfig, bool) {
        let mut default = SloAvailabilityConfig {
            custom: false,
            objective_percentage: default_threshold(ids::SLO_AVAILABILITY),
            ..Default::default()
        };
        if app.kind == ApplicationKind::ExternalService {
            default.objective_percentage = 0.0;
        }

        let resolution = self.resolve(app, ids::SLO_AVAILABILITY);
        let Some(raw) = resolution.payload else {
            return (default, true);
        };
        match raw.decode::<Vec<SloAvailabilityConfig>>() {
            Ok(list) => match list.into_iter().next() {
                Some(cfg) => (cfg, false),
                None => (default, true),
            },
            Err(e) => {
                decode_failed(ids::SLO_AVAILABILITY, &resolution.selector_label(), &e);
                (default, true)
            }
        }
    }

    /// Latency SLO of an application with the default bucket settings
    pub fn get_latency(&self, app: &ApplicationId, category: &ApplicationCategory) -> (SloLatencyConfig, bool) {
        self.get_latency_with(app, category, &SloSettings::default())
    }

    /// Latency SLO of an application and whether the default was used.
    ///
    /// Auxiliary categories get the auxiliary objective bucket by default and
    /// also when only the platform-wide override applies.
    pub fn get_latency_with(
        &self,
        app: &ApplicationId,
        category: &ApplicationCategory,
        settings: &SloSettings,
    ) -> (SloLatencyConfig, bool) {
        let auxiliary = category.is_auxiliary();
        let mut default = SloLatencyConfig {
            custom: false,
            objective_percentage: default_threshold(ids::SLO_LATENCY),
            objective_bucket: settings.objective_bucket_for(auxiliary),
            ..Default::default()
        };
        if app.kind == ApplicationKind::ExternalService {
            default.objective_percentage = 0.0;
        }

        let resolution = self.resolve(app, ids::SLO_LATENCY);
        let Some(raw) = resolution.payload else {
            return (default, true);
        };
        let mut cfg = match raw.decode::<Vec<SloLatencyConfig>>() {
            Ok(list) => match list.into_iter().next() {
                Some(cfg) => cfg,
                None => return (default, true),
            },
            Err(e) => {
                decode_failed(ids::SLO_LATENCY, &resolution.selector_label(), &e);
                return (default, true);
            }
        };
        if resolution.is_global_default() && auxiliary {
            cfg.objective_bucket = settings.auxiliary_objective_bucket;
        }
        (cfg, false)
    }
}

/// Shared, atomically replaceable override document
///
/// Readers take an `Arc` snapshot and resolve a whole scan against it;
/// refreshes swap in a new document without touching existing snapshots.
#[derive(Debug, Default)]
pub struct OverrideStore {
    current: RwLock<Arc<CheckConfigs>>,
}

impl OverrideStore {
    pub fn new(configs: CheckConfigs) -> Self {
        Self {
            current: RwLock::new(Arc::new(configs)),
        }
    }

    pub fn snapshot(&self) -> Arc<CheckConfigs> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Install a new document, returning the previous one
    pub fn replace(&self, configs: CheckConfigs) -> Arc<CheckConfigs> {
        let next = Arc::new(configs);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

fn definition(check_id: &str) -> Option<&'static CheckDefinition> {
    let definition = registry::lookup(check_id);
    if definition.is_none() {
        LOG.log_unknown_check(check_id);
        EngineMetrics::new().inc_unknown_check_lookups();
    }
    definition
}

fn default_threshold(check_id: &str) -> f32 {
    definition(check_id)
        .map(|d| d.default_threshold)
        .unwrap_or_default()
}

fn decode_failed(check_id: &str, selector: &str, error: &dyn std::error::Error) {
    LOG.log_decode_failure(check_id, selector, error);
    EngineMetrics::new().inc_override_decode_failures();
}
