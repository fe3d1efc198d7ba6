//! Threshold resolution for one application

use anyhow::{bail, Result};
use check_engine::{registry, ApplicationId, CheckConfigs, CheckDefinition, ConfigShape, Tier};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{color_tier, format_optional, print_json, print_table, OutputFormat};

/// Resolved thresholds of one check
#[derive(Debug, Serialize)]
struct Resolved {
    check: &'static str,
    builtin: Option<f32>,
    global: Option<f32>,
    app: Option<f32>,
    effective: f32,
    #[serde(serialize_with = "serialize_tier")]
    tier: Tier,
}

fn serialize_tier<S: serde::Serializer>(tier: &Tier, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(tier.as_str())
}

/// Row for the resolution table
#[derive(Tabled)]
struct ResolvedRow {
    #[tabled(rename = "Check")]
    check: &'static str,
    #[tabled(rename = "Builtin")]
    builtin: String,
    #[tabled(rename = "Global")]
    global: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Effective")]
    effective: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// Show builtin, global, app-specific and effective thresholds
pub fn resolve_thresholds(
    configs: &CheckConfigs,
    app: &ApplicationId,
    check: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let definitions: Vec<&CheckDefinition> = match check {
        Some(id) => {
            let Some(def) = registry::lookup(id) else {
                bail!("unknown check: {}", id);
            };
            if def.config_shape != ConfigShape::Simple {
                bail!("{} is an SLO check; use `checkctl slo` instead", id);
            }
            vec![def]
        }
        None => registry::registry()
            .iter()
            .filter(|def| def.config_shape == ConfigShape::Simple)
            .collect(),
    };

    let resolved: Vec<Resolved> = definitions
        .iter()
        .map(|def| resolve_one(configs, app, def))
        .collect();

    match format {
        OutputFormat::Json => print_json(&resolved),
        OutputFormat::Table => {
            let rows: Vec<ResolvedRow> = definitions
                .iter()
                .zip(&resolved)
                .map(|(def, r)| {
                    let fmt = |v: Option<f32>| format_optional(v.map(|v| def.unit.format_value(v)));
                    ResolvedRow {
                        check: r.check,
                        builtin: fmt(r.builtin),
                        global: fmt(r.global),
                        app: fmt(r.app),
                        effective: def.unit.format_value(r.effective),
                        source: color_tier(r.tier),
                    }
                })
                .collect();
            print_table(&rows);
            Ok(())
        }
    }
}

fn resolve_one(configs: &CheckConfigs, app: &ApplicationId, def: &CheckDefinition) -> Resolved {
    let all = configs.get_simple_all(def.id, app);
    let threshold = |i: usize| all.get(i).copied().flatten().map(|c| c.threshold);
    Resolved {
        check: def.id,
        builtin: threshold(0),
        global: threshold(1),
        app: threshold(2),
        effective: configs.get_simple(def.id, app).threshold,
        tier: configs.resolve(app, def.id).tier,
    }
}
