//! Output formatting utilities

use anyhow::Result;
use check_engine::Tier;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Threshold cell; `-` when nothing is configured
pub fn format_optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".dimmed().to_string())
}

/// Color a resolution tier by how specific it is
pub fn color_tier(tier: Tier) -> String {
    let label = tier.as_str();
    match tier {
        Tier::Application => label.green().to_string(),
        Tier::Pattern => label.cyan().to_string(),
        Tier::Global => label.blue().to_string(),
        Tier::Builtin => label.dimmed().to_string(),
    }
}

/// Yes/no flag for whether a default configuration was used
pub fn format_default_flag(used_default: bool) -> String {
    if used_default {
        "default".dimmed().to_string()
    } else {
        "custom".green().to_string()
    }
}
