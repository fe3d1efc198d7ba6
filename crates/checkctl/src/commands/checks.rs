//! Registry listing

use anyhow::Result;
use check_engine::registry;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

/// Row for the check catalog table
#[derive(Tabled, Serialize)]
struct CheckRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Title")]
    title: &'static str,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Unit")]
    unit: &'static str,
    #[tabled(rename = "Condition")]
    condition: String,
}

/// List every registered check with its default threshold
pub fn list_checks(format: OutputFormat) -> Result<()> {
    let rows: Vec<CheckRow> = registry::registry()
        .iter()
        .map(|def| CheckRow {
            id: def.id,
            kind: def.kind.as_str(),
            title: def.title,
            default: def.unit.format_value(def.default_threshold),
            unit: def.unit.as_str(),
            condition: def.format_condition(def.default_threshold),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(&rows);
            Ok(())
        }
    }
}
