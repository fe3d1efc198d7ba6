//! Human-readable formatting of check measurements
//!
//! All functions are total: unexpected inputs (NaN, infinities, negative
//! sizes) fall back to plain decimal output instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};

const BYTE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

/// Duration scales as (seconds per unit, suffix), largest first
const DURATION_SCALES: &[(f64, &str)] = &[
    (86_400.0, "d"),
    (3_600.0, "h"),
    (60.0, "m"),
    (1.0, "s"),
    (1e-3, "ms"),
    (1e-6, "µs"),
];

/// Measurement unit of a check threshold and value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "percent")]
    Percent,
    #[serde(rename = "second")]
    Second,
    #[serde(rename = "byte")]
    Byte,
    #[serde(rename = "seconds/second")]
    SecondsPerSecond,
    #[default]
    #[serde(rename = "")]
    None,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Percent => "percent",
            Unit::Second => "second",
            Unit::Byte => "byte",
            Unit::SecondsPerSecond => "seconds/second",
            Unit::None => "",
        }
    }

    /// Format a raw measurement expressed in this unit
    pub fn format_value(&self, v: f32) -> String {
        format_value(v, *self)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a raw measurement according to its unit
pub fn format_value(v: f32, unit: Unit) -> String {
    match unit {
        Unit::Second => format_duration(v as f64, 1),
        Unit::SecondsPerSecond => format!("{}/second", format_duration(v as f64, 1)),
        Unit::Byte => {
            let (value, suffix) = format_bytes(v);
            format!("{}{}", value, suffix)
        }
        Unit::Percent => format_percentage(v),
        Unit::None => format_float(v),
    }
}

/// Plain decimal with at most two fractional digits
pub fn format_float(v: f32) -> String {
    trim_decimal(v as f64, 2)
}

pub fn format_percentage(v: f32) -> String {
    format!("{}%", format_float(v))
}

/// Scale a number of seconds to the largest unit that keeps it >= 1.
///
/// A value that rounds up to the next unit boundary is shown in that unit,
/// so 59.99s is `1m`, not `60s`.
pub fn format_duration(seconds: f64, precision: usize) -> String {
    if !seconds.is_finite() {
        return trim_decimal(seconds, precision);
    }
    if seconds == 0.0 {
        return "0".to_string();
    }
    let abs = seconds.abs();
    let mut idx = DURATION_SCALES
        .iter()
        .position(|(scale, _)| abs >= *scale)
        .unwrap_or(DURATION_SCALES.len() - 1);
    if idx > 0 {
        let (scale, _) = DURATION_SCALES[idx];
        let (larger, _) = DURATION_SCALES[idx - 1];
        if round_to(abs / scale, precision) >= (larger / scale).round() {
            idx -= 1;
        }
    }
    let (scale, suffix) = DURATION_SCALES[idx];
    format!("{}{}", trim_decimal(seconds / scale, precision), suffix)
}

/// Scale a byte count to a 1024-based unit, returning (value, unit)
pub fn format_bytes(bytes: f32) -> (String, &'static str) {
    let mut value = bytes as f64;
    if !value.is_finite() {
        return (trim_decimal(value, 1), BYTE_UNITS[0]);
    }
    let mut idx = 0;
    while round_to(value.abs(), 1) >= 1024.0 && idx < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    (trim_decimal(value, 1), BYTE_UNITS[idx])
}

fn round_to(v: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (v * factor).round() / factor
}

fn trim_decimal(v: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, v);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
