//! Catalog of built-in check definitions
//!
//! The registry is built once from an explicit list and is read-only
//! afterwards. Ids are the symbolic names listed in [`ids`].

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::{CheckError, Result};
use crate::evaluator::Template;
use crate::units::Unit;

static REGISTRY: OnceLock<CheckRegistry> = OnceLock::new();

/// How a check decides whether it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Fires when the event counter exceeds the threshold
    EventBased,
    /// Fires when at least one affected item was recorded
    ItemBased,
    /// Fires when the scalar value exceeds the threshold
    ValueBased,
    /// Fires only when explicitly marked by the collector
    Manual,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::EventBased => "event_based",
            CheckKind::ItemBased => "item_based",
            CheckKind::ValueBased => "value_based",
            CheckKind::Manual => "manual",
        }
    }
}

/// Shape an override payload for a check decodes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigShape {
    Simple,
    SloAvailability,
    SloLatency,
}

/// Immutable definition of a check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckDefinition {
    pub id: &'static str,
    pub kind: CheckKind,
    pub title: &'static str,
    pub default_threshold: f32,
    pub unit: Unit,
    pub message_template: &'static str,
    pub condition_template: &'static str,
    pub config_shape: ConfigShape,
}

impl CheckDefinition {
    pub const fn new(
        id: &'static str,
        kind: CheckKind,
        title: &'static str,
        default_threshold: f32,
        message_template: &'static str,
        condition_template: &'static str,
    ) -> Self {
        Self {
            id,
            kind,
            title,
            default_threshold,
            unit: Unit::None,
            message_template,
            condition_template,
            config_shape: ConfigShape::Simple,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_config_shape(mut self, shape: ConfigShape) -> Self {
        self.config_shape = shape;
        self
    }

    /// Condition text with `<threshold>` replaced by the formatted value
    pub fn format_condition(&self, threshold: f32) -> String {
        self.condition_template
            .replace("<threshold>", &self.unit.format_value(threshold))
    }
}

/// Symbolic check ids
pub mod ids {
    pub const SLO_AVAILABILITY: &str = "SLOAvailability";
    pub const SLO_LATENCY: &str = "SLOLatency";
    pub const CPU_NODE: &str = "CPUNode";
    pub const CPU_CONTAINER: &str = "CPUContainer";
    pub const MEMORY_OOM: &str = "MemoryOOM";
    pub const MEMORY_LEAK_PERCENT: &str = "MemoryLeakPercent";
    pub const MEMORY_PRESSURE: &str = "MemoryPressure";
    pub const STORAGE_SPACE: &str = "StorageSpace";
    pub const STORAGE_IO_LOAD: &str = "StorageIOLoad";
    pub const NETWORK_RTT: &str = "NetworkRTT";
    pub const NETWORK_CONNECTIVITY: &str = "NetworkConnectivity";
    pub const NETWORK_TCP_CONNECTIONS: &str = "NetworkTCPConnections";
    pub const INSTANCE_AVAILABILITY: &str = "InstanceAvailability";
    pub const DEPLOYMENT_STATUS: &str = "DeploymentStatus";
    pub const INSTANCE_RESTARTS: &str = "InstanceRestarts";
    pub const REDIS_AVAILABILITY: &str = "RedisAvailability";
    pub const REDIS_LATENCY: &str = "RedisLatency";
    pub const MONGODB_AVAILABILITY: &str = "MongodbAvailability";
    pub const MONGODB_REPLICATION_LAG: &str = "MongodbReplicationLag";
    pub const MEMCACHED_AVAILABILITY: &str = "MemcachedAvailability";
    pub const POSTGRES_AVAILABILITY: &str = "PostgresAvailability";
    pub const POSTGRES_LATENCY: &str = "PostgresLatency";
    pub const POSTGRES_REPLICATION_LAG: &str = "PostgresReplicationLag";
    pub const POSTGRES_CONNECTIONS: &str = "PostgresConnections";
    pub const LOG_ERRORS: &str = "LogErrors";
    pub const JVM_AVAILABILITY: &str = "JvmAvailability";
    pub const JVM_SAFEPOINT_TIME: &str = "JvmSafepointTime";
    pub const DOTNET_AVAILABILITY: &str = "DotNetAvailability";
    pub const PYTHON_GIL_WAITING_TIME: &str = "PythonGILWaitingTime";
    pub const NODEJS_EVENT_LOOP_BLOCKED_TIME: &str = "NodejsEventLoopBlockedTime";
    pub const DNS_LATENCY: &str = "DnsLatency";
    pub const DNS_SERVER_ERRORS: &str = "DnsServerErrors";
    pub const DNS_NXDOMAIN_ERRORS: &str = "DnsNxdomainErrors";
    pub const MYSQL_AVAILABILITY: &str = "MysqlAvailability";
    pub const MYSQL_REPLICATION_STATUS: &str = "MysqlReplicationStatus";
    pub const MYSQL_REPLICATION_LAG: &str = "MysqlReplicationLag";
    pub const MYSQL_CONNECTIONS: &str = "MysqlConnections";
}

/// Lookup table over a fixed set of definitions
#[derive(Debug)]
pub struct CheckRegistry {
    definitions: Vec<CheckDefinition>,
    index: HashMap<&'static str, usize>,
}

impl CheckRegistry {
    /// Build a registry, rejecting duplicate ids and unparsable message templates
    pub fn build(definitions: Vec<CheckDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.id, i).is_some() {
                return Err(CheckError::DuplicateCheck(def.id.to_string()));
            }
            Template::parse(def.message_template)?;
        }
        Ok(Self { definitions, index })
    }

    pub fn lookup(&self, id: &str) -> Option<&CheckDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    /// Definitions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Process-wide registry of built-in checks
///
/// Panics on first use if the built-in list is invalid.
pub fn registry() -> &'static CheckRegistry {
    REGISTRY.get_or_init(|| {
        CheckRegistry::build(builtin_definitions())
            .unwrap_or_else(|e| panic!("invalid built-in check registry: {e}"))
    })
}

/// Shorthand for `registry().lookup(id)`
pub fn lookup(id: &str) -> Option<&'static CheckDefinition> {
    registry().lookup(id)
}

/// The built-in check catalog
pub fn builtin_definitions() -> Vec<CheckDefinition> {
    use CheckKind::*;

    vec![
        CheckDefinition::new(
            ids::SLO_AVAILABILITY,
            Manual,
            "Availability",
            99.0,
            "the app is serving errors",
            "the successful request percentage < <threshold>",
        )
        .with_unit(Unit::Percent)
        .with_config_shape(ConfigShape::SloAvailability),
        CheckDefinition::new(
            ids::SLO_LATENCY,
            Manual,
            "Latency",
            99.0,
            "the app is performing slowly",
            "the percentage of requests served faster than <bucket> < <threshold>",
        )
        .with_unit(Unit::Percent)
        .with_config_shape(ConfigShape::SloLatency),
        CheckDefinition::new(
            ids::CPU_NODE,
            ItemBased,
            "Node CPU utilization",
            80.0,
            r#"high CPU utilization of {{.Items "node"}}"#,
            "the CPU usage of a node > <threshold>",
        )
        .with_unit(Unit::Percent),
        CheckDefinition::new(
            ids::CPU_CONTAINER,
            ItemBased,
            "Container CPU utilization",
            80.0,
            r#"high CPU utilization of {{.Items "container"}}"#,
            "the CPU usage of a container > <threshold> of its CPU limit",
        )
        .with_unit(Unit::Percent),
        CheckDefinition::new(
            ids::MEMORY_OOM,
            EventBased,
            "Out of Memory",
            0.0,
            r#"app containers have been restarted {{.Count "time"}} by the OOM killer"#,
            "the number of container terminations due to Out of Memory > <threshold>",
        ),
        CheckDefinition::new(
            ids::MEMORY_LEAK_PERCENT,
            ValueBased,
            "Memory leak",
            10.0,
            "memory usage is growing by {{.Value}} % per hour",
            "memory usage is growing by > <threshold> % per hour",
        ),
        CheckDefinition::new(
            ids::MEMORY_PRESSURE,
            ItemBased,
            "Memory pressure",
            0.02,
            r#"high memory stall time on {{.Items "instance"}}"#,
            "memory stall time > <threshold> per second",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::STORAGE_SPACE,
            ItemBased,
            "Disk space",
            80.0,
            r#"disk space on {{.Items "volume"}} will be exhausted soon"#,
            "the disk space usage > <threshold>",
        )
        .with_unit(Unit::Percent),
        CheckDefinition::new(
            ids::STORAGE_IO_LOAD,
            ItemBased,
            "Disk I/O load",
            5.0,
            r#"high I/O load on {{.Items "volume"}}"#,
            "the I/O load of a disk > <threshold>",
        )
        .with_unit(Unit::SecondsPerSecond),
        CheckDefinition::new(
            ids::NETWORK_RTT,
            ItemBased,
            "Network round-trip time (RTT)",
            0.01,
            r#"high network latency to {{.Items "upstream service"}}"#,
            "the network round-trip time > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::NETWORK_CONNECTIVITY,
            ItemBased,
            "Network connectivity",
            0.0,
            r#"no connectivity with {{.Items "upstream service"}}"#,
            "the number of unavailable upstream services > <threshold>",
        ),
        CheckDefinition::new(
            ids::NETWORK_TCP_CONNECTIONS,
            ItemBased,
            "TCP connections",
            0.0,
            r#"failed to connect to {{.Items "upstream service"}}"#,
            "the number of upstream services to which the app failed to connect > <threshold>",
        ),
        CheckDefinition::new(
            ids::INSTANCE_AVAILABILITY,
            Manual,
            "Instance availability",
            75.0,
            r#"{{.ItemsWithToBe "instance"}} unavailable"#,
            "the number of available instances < <threshold> of desired",
        )
        .with_unit(Unit::Percent),
        CheckDefinition::new(
            ids::DEPLOYMENT_STATUS,
            ValueBased,
            "Deployment status",
            180.0,
            "the rollout has already been in progress for {{.Value}}",
            "a rollout is in progress > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::INSTANCE_RESTARTS,
            EventBased,
            "Restarts",
            0.0,
            r#"app containers have been restarted {{.Count "time"}}"#,
            "the number of container restarts > <threshold>",
        ),
        CheckDefinition::new(
            ids::REDIS_AVAILABILITY,
            ItemBased,
            "Redis availability",
            0.0,
            r#"{{.ItemsWithToBe "redis instance"}} unavailable"#,
            "the number of unavailable redis instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::REDIS_LATENCY,
            ItemBased,
            "Redis latency",
            0.005,
            r#"{{.ItemsWithToBe "redis instance"}} performing slowly"#,
            "the average command execution time of a redis instance > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::MONGODB_AVAILABILITY,
            ItemBased,
            "Mongodb availability",
            0.0,
            r#"{{.ItemsWithToBe "mongodb instance"}} unavailable"#,
            "the number of unavailable mongodb instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::MONGODB_REPLICATION_LAG,
            ItemBased,
            "Mongodb replication lag",
            30.0,
            r#"{{.ItemsWithToBe "mongodb replica"}} far behind the primary"#,
            "replication lag > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::MEMCACHED_AVAILABILITY,
            ItemBased,
            "Memcached availability",
            0.0,
            r#"{{.ItemsWithToBe "memcached instance"}} unavailable"#,
            "the number of unavailable memcached instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::POSTGRES_AVAILABILITY,
            ItemBased,
            "Postgres availability",
            0.0,
            r#"{{.ItemsWithToBe "postgres instance"}} unavailable"#,
            "the number of unavailable postgres instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::POSTGRES_LATENCY,
            ItemBased,
            "Postgres latency",
            0.1,
            r#"{{.ItemsWithToBe "postgres instance"}} performing slowly"#,
            "the average query execution time of a postgres instance > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::POSTGRES_REPLICATION_LAG,
            ItemBased,
            "Postgres replication lag",
            30.0,
            r#"{{.ItemsWithToBe "postgres replica"}} far behind the primary"#,
            "replication lag > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::POSTGRES_CONNECTIONS,
            ItemBased,
            "Postgres connections",
            90.0,
            r#"{{.ItemsWithHave "postgres instance"}} too many connections"#,
            "the number of connections > <threshold> of `max_connections`",
        )
        .with_unit(Unit::Percent),
        CheckDefinition::new(
            ids::LOG_ERRORS,
            EventBased,
            "Errors",
            0.0,
            r#"{{.Count "error"}} occurred"#,
            "the number of messages with the ERROR and CRITICAL severity levels > <threshold>",
        ),
        CheckDefinition::new(
            ids::JVM_AVAILABILITY,
            ItemBased,
            "JVM availability",
            0.0,
            r#"{{.ItemsWithToBe "JVM instance"}} unavailable"#,
            "the number of unavailable JVM instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::JVM_SAFEPOINT_TIME,
            ItemBased,
            "JVM safepoints",
            0.05,
            r#"high safepoint times on {{.Items "JVM instance"}}"#,
            "the time the app has been stopped for safepoint operations > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::DOTNET_AVAILABILITY,
            ItemBased,
            ".NET runtime availability",
            0.0,
            r#"{{.ItemsWithToBe ".NET instance"}} unavailable"#,
            "the number of unavailable .NET instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::PYTHON_GIL_WAITING_TIME,
            ItemBased,
            "Python GIL (Global Interpreter Lock) waiting time",
            0.05,
            r#"high GIL waiting times on {{.Items "Python instance"}}"#,
            "the time Python threads have been waiting for acquiring the GIL > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::NODEJS_EVENT_LOOP_BLOCKED_TIME,
            ItemBased,
            "Node.js event loop blocked time",
            0.7,
            r#"high Node.js event loop blocked times on {{.Items "Node.js instance"}}"#,
            "the time the Node.js event loop executes blocking code > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::DNS_LATENCY,
            ValueBased,
            "DNS latency",
            0.1,
            "high DNS latency",
            "the 95th percentile of DNS response time > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::DNS_SERVER_ERRORS,
            EventBased,
            "DNS server errors",
            0.0,
            r#"{{.Count "server DNS error"}} occurred"#,
            "the number of server DNS errors (excluding NXDOMAIN) > <threshold>",
        ),
        CheckDefinition::new(
            ids::DNS_NXDOMAIN_ERRORS,
            EventBased,
            "DNS NXDOMAIN errors",
            0.0,
            r#"the app received an empty DNS response {{.Count "time"}}"#,
            "the number of NXDOMAIN DNS errors (for previously valid requests) > <threshold>",
        ),
        CheckDefinition::new(
            ids::MYSQL_AVAILABILITY,
            ItemBased,
            "Mysql availability",
            0.0,
            r#"{{.ItemsWithToBe "mysql instance"}} unavailable"#,
            "the number of unavailable mysql instances > <threshold>",
        ),
        CheckDefinition::new(
            ids::MYSQL_REPLICATION_STATUS,
            ItemBased,
            "Mysql replication status",
            0.0,
            r#"{{.ItemsWithHave "mysql replica"}} IO or SQL replication thread issues"#,
            "the IO or SQL replication thread is not running",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::MYSQL_REPLICATION_LAG,
            ItemBased,
            "Mysql replication lag",
            30.0,
            r#"{{.ItemsWithToBe "mysql replica"}} far behind the primary"#,
            "replication lag > <threshold>",
        )
        .with_unit(Unit::Second),
        CheckDefinition::new(
            ids::MYSQL_CONNECTIONS,
            ItemBased,
            "Mysql connections",
            90.0,
            r#"{{.ItemsWithHave "mysql instance"}} too many connections"#,
            "the number of connections > <threshold> of `max_connections`",
        )
        .with_unit(Unit::Percent),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;

    #[test]
    fn test_builtin_registry_is_complete() {
        let registry = registry();
        assert_eq!(registry.len(), builtin_definitions().len());
        for def in builtin_definitions() {
            assert_eq!(registry.lookup(def.id), Some(&def));
        }
    }

    #[test]
    fn test_lookup_unknown_check() {
        assert!(lookup("NoSuchCheck").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let def = CheckDefinition::new("Dup", CheckKind::Manual, "dup", 0.0, "", "");
        let err = CheckRegistry::build(vec![def.clone(), def]).unwrap_err();
        assert!(matches!(err, CheckError::DuplicateCheck(id) if id == "Dup"));
    }

    #[test]
    fn test_broken_template_rejected() {
        let def = CheckDefinition::new("Broken", CheckKind::Manual, "broken", 0.0, "{{.Items", "");
        let err = CheckRegistry::build(vec![def]).unwrap_err();
        assert!(matches!(err, CheckError::Template(TemplateError::Parse { .. })));
    }

    #[test]
    fn test_slo_checks_declare_their_shapes() {
        assert_eq!(
            lookup(ids::SLO_AVAILABILITY).unwrap().config_shape,
            ConfigShape::SloAvailability
        );
        assert_eq!(
            lookup(ids::SLO_LATENCY).unwrap().config_shape,
            ConfigShape::SloLatency
        );
        let simple = registry()
            .iter()
            .filter(|d| d.config_shape == ConfigShape::Simple)
            .count();
        assert_eq!(simple, registry().len() - 2);
    }

    #[test]
    fn test_format_condition() {
        let def = lookup(ids::STORAGE_SPACE).unwrap();
        assert_eq!(def.format_condition(85.0), "the disk space usage > 85%");
        let def = lookup(ids::NETWORK_RTT).unwrap();
        assert_eq!(def.format_condition(0.01), "the network round-trip time > 10ms");
    }

    #[test]
    fn test_declaration_order_preserved() {
        let first: Vec<_> = registry().iter().take(2).map(|d| d.id).collect();
        assert_eq!(first, vec![ids::SLO_AVAILABILITY, ids::SLO_LATENCY]);
    }
}
