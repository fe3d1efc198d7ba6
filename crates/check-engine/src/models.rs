//! Core data models shared by the resolver and the evaluator
//!
//! Application identity and telemetry types are owned by upstream
//! collaborators; only the parts the engine reads are modelled here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// Workload kind of a monitored application
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ApplicationKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    CronJob,
    Job,
    ExternalService,
    #[default]
    Unknown,
    Other(String),
}

impl ApplicationKind {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationKind::Deployment => "Deployment",
            ApplicationKind::StatefulSet => "StatefulSet",
            ApplicationKind::DaemonSet => "DaemonSet",
            ApplicationKind::CronJob => "CronJob",
            ApplicationKind::Job => "Job",
            ApplicationKind::ExternalService => "ExternalService",
            ApplicationKind::Unknown => "",
            ApplicationKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ApplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ApplicationKind {
    fn from(s: &str) -> Self {
        match s {
            "Deployment" => ApplicationKind::Deployment,
            "StatefulSet" => ApplicationKind::StatefulSet,
            "DaemonSet" => ApplicationKind::DaemonSet,
            "CronJob" => ApplicationKind::CronJob,
            "Job" => ApplicationKind::Job,
            "ExternalService" => ApplicationKind::ExternalService,
            "" => ApplicationKind::Unknown,
            other => ApplicationKind::Other(other.to_string()),
        }
    }
}

/// Identity of a monitored application
///
/// The string form is `namespace:Kind:name`. The zero id (all parts empty)
/// stands for the platform-wide scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ApplicationId {
    pub namespace: String,
    pub kind: ApplicationKind,
    pub name: String,
}

impl ApplicationId {
    pub fn new(namespace: impl Into<String>, kind: ApplicationKind, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            name: name.into(),
        }
    }

    /// The platform-wide scope
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.namespace.is_empty() && self.kind == ApplicationKind::Unknown && self.name.is_empty()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return Ok(());
        }
        write!(f, "{}:{}:{}", self.namespace, self.kind, self.name)
    }
}

impl FromStr for ApplicationId {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::zero());
        }
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(kind), Some(name)) => {
                Ok(Self::new(namespace, ApplicationKind::from(kind), name))
            }
            _ => Err(CheckError::InvalidSelector {
                selector: s.to_string(),
                reason: "expected namespace:Kind:name".to_string(),
            }),
        }
    }
}

impl Serialize for ApplicationId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApplicationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Category an application is assigned to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationCategory(pub String);

impl ApplicationCategory {
    pub const APPLICATION: &'static str = "application";
    pub const CONTROL_PLANE: &'static str = "control-plane";
    pub const MONITORING: &'static str = "monitoring";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Infrastructure categories get relaxed latency objectives
    pub fn is_auxiliary(&self) -> bool {
        matches!(self.0.as_str(), Self::CONTROL_PLANE | Self::MONITORING)
    }
}

impl fmt::Display for ApplicationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of an evaluated check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unknown,
    #[default]
    Ok,
    Info,
    Warning,
    Critical,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Ok => "ok",
            Status::Info => "info",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evenly spaced series attached to a check for display
///
/// The evaluator never inspects the points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub from: DateTime<Utc>,
    pub step_secs: i64,
    pub values: Vec<f32>,
}

impl TimeSeries {
    pub fn new(from: DateTime<Utc>, step_secs: i64, values: Vec<f32>) -> Self {
        Self {
            from,
            step_secs,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp of the last point; `None` when empty or out of range
    pub fn to(&self) -> Option<DateTime<Utc>> {
        let n = i64::try_from(self.values.len().checked_sub(1)?).ok()?;
        let span = Duration::try_seconds(self.step_secs.checked_mul(n)?)?;
        self.from.checked_add_signed(span)
    }

    /// Last non-NaN value
    pub fn last(&self) -> Option<f32> {
        self.values.iter().rev().copied().find(|v| !v.is_nan())
    }
}
