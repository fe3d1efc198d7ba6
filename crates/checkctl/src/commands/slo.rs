//! SLO configuration for one application

use anyhow::Result;
use check_engine::{
    ApplicationCategory, ApplicationId, CheckConfigs, SloAvailabilityConfig, SloLatencyConfig,
    SloSettings, Unit,
};
use colored::Colorize;
use serde::Serialize;

use crate::output::{format_default_flag, print_heading, print_info, print_json, print_warning, OutputFormat};

#[derive(Debug, Serialize)]
struct SloReport {
    app: String,
    category: String,
    availability: AvailabilityReport,
    latency: LatencyReport,
}

#[derive(Debug, Serialize)]
struct AvailabilityReport {
    #[serde(flatten)]
    config: SloAvailabilityConfig,
    used_default: bool,
    total_query: String,
    failed_query: String,
}

#[derive(Debug, Serialize)]
struct LatencyReport {
    #[serde(flatten)]
    config: SloLatencyConfig,
    used_default: bool,
    histogram: String,
}

/// Show the resolved availability and latency objectives
pub fn show_slo(
    configs: &CheckConfigs,
    app: &ApplicationId,
    category: &ApplicationCategory,
    settings: &SloSettings,
    format: OutputFormat,
) -> Result<()> {
    let (availability, availability_default) = configs.get_availability(app);
    let (latency, latency_default) = configs.get_latency_with(app, category, settings);

    let report = SloReport {
        app: app.to_string(),
        category: category.to_string(),
        availability: AvailabilityReport {
            total_query: availability.total(),
            failed_query: availability.failed(),
            config: availability,
            used_default: availability_default,
        },
        latency: LatencyReport {
            histogram: latency.histogram(),
            config: latency,
            used_default: latency_default,
        },
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            print_table_report(&report);
            Ok(())
        }
    }
}

fn print_table_report(report: &SloReport) {
    print_heading("Service Level Objectives");
    println!("Application:            {}", report.app.cyan());
    if !report.category.is_empty() {
        println!("Category:               {}", report.category);
    }
    println!();

    let availability = &report.availability;
    println!("{}", "Availability".bold());
    println!("{}", "-".repeat(50));
    println!("Source:                 {}", format_default_flag(availability.used_default));
    println!("Objective:              {}", availability_objective(&availability.config));
    if !availability.config.total_requests_query.is_empty() {
        println!("Total requests:         {}", availability.total_query);
        println!("Failed requests:        {}", availability.failed_query);
    }
    if !availability.config.error.is_empty() {
        print_warning(&availability.config.error);
    }
    println!();

    let latency = &report.latency;
    println!("{}", "Latency".bold());
    println!("{}", "-".repeat(50));
    println!("Source:                 {}", format_default_flag(latency.used_default));
    println!("Objective:              {}", latency_objective(&latency.config));
    if !latency.config.histogram_query.is_empty() {
        println!("Histogram:              {}", latency.histogram);
    }
    if !latency.config.error.is_empty() {
        print_warning(&latency.config.error);
    }

    if availability.config.objective_percentage == 0.0 && latency.config.objective_percentage == 0.0 {
        println!();
        print_info("objectives are disabled for this application");
    }
}

fn availability_objective(cfg: &SloAvailabilityConfig) -> String {
    Unit::Percent.format_value(cfg.objective_percentage)
}

fn latency_objective(cfg: &SloLatencyConfig) -> String {
    format!(
        "{} of requests faster than {}",
        Unit::Percent.format_value(cfg.objective_percentage),
        Unit::Second.format_value(cfg.objective_bucket)
    )
}
