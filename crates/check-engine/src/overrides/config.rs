//! Typed check configurations decoded from override payloads

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{CheckError, Result};
use crate::registry::{self, CheckDefinition, ConfigShape};

/// Undecoded JSON payload of a single override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(String);

impl RawPayload {
    pub fn new(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.0)
    }
}

impl fmt::Display for RawPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RawPayload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.0.clone()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawPayload {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(Self(raw.get().to_string()))
    }
}

/// Where an SLO configuration was ingested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    #[serde(rename = "kubernetes-annotations")]
    KubernetesAnnotations,
}

/// Single-threshold configuration used by most checks
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimpleThreshold {
    pub threshold: f32,
}

impl SimpleThreshold {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

/// Availability objective over request-rate queries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SloAvailabilityConfig {
    pub custom: bool,
    pub total_requests_query: String,
    pub failed_requests_query: String,
    pub objective_percentage: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfigSource>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl SloAvailabilityConfig {
    pub fn total(&self) -> String {
        format!("sum(rate({}[$RANGE]))", self.total_requests_query)
    }

    pub fn failed(&self) -> String {
        format!("sum(rate({}[$RANGE]))", self.failed_requests_query)
    }
}

/// Latency objective over a histogram query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SloLatencyConfig {
    pub custom: bool,
    pub histogram_query: String,
    pub objective_bucket: f32,
    pub objective_percentage: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfigSource>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl SloLatencyConfig {
    pub fn histogram(&self) -> String {
        format!("sum by(le)(rate({}[$RANGE]))", self.histogram_query)
    }
}

/// A decoded override in the shape its check declares
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedConfig {
    Simple(SimpleThreshold),
    Availability(SloAvailabilityConfig),
    Latency(SloLatencyConfig),
}

/// Decode a payload into the shape declared by `definition`.
///
/// SLO payloads are lists; every element is returned.
pub fn decode_payload(definition: &CheckDefinition, raw: &RawPayload) -> Result<Vec<ResolvedConfig>> {
    let decode_err = |source| CheckError::Decode {
        check: definition.id.to_string(),
        source,
    };
    let configs = match definition.config_shape {
        ConfigShape::Simple => vec![ResolvedConfig::Simple(raw.decode().map_err(decode_err)?)],
        ConfigShape::SloAvailability => raw
            .decode::<Vec<SloAvailabilityConfig>>()
            .map_err(decode_err)?
            .into_iter()
            .map(ResolvedConfig::Availability)
            .collect(),
        ConfigShape::SloLatency => raw
            .decode::<Vec<SloLatencyConfig>>()
            .map_err(decode_err)?
            .into_iter()
            .map(ResolvedConfig::Latency)
            .collect(),
    };
    Ok(configs)
}

/// Decode a payload for a registered check id
pub fn decode(check_id: &str, raw: &RawPayload) -> Result<Vec<ResolvedConfig>> {
    let definition =
        registry::lookup(check_id).ok_or_else(|| CheckError::UnknownCheck(check_id.to_string()))?;
    decode_payload(definition, raw)
}
