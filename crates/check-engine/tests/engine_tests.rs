//! Integration tests for override resolution and check evaluation

use std::sync::Arc;
use std::thread;

use check_engine::{
    registry::{self, ids},
    ApplicationCategory, ApplicationId, ApplicationKind, ApplicationSelector, Check, CheckConfigs,
    CheckKind, EngineMetrics, OverrideStore, SimpleThreshold, SloLatencyConfig, Status, Tier,
};

fn cart() -> ApplicationId {
    ApplicationId::new("shop", ApplicationKind::Deployment, "cart")
}

fn overrides() -> CheckConfigs {
    serde_json::from_str(
        r#"{
            "": {
                "CPUNode": {"threshold": 90},
                "LogErrors": {"threshold": 5},
                "SLOLatency": [{"custom": false, "objective_bucket": 1, "objective_percentage": 95}]
            },
            "shop:*": {"LogErrors": {"threshold": 50}},
            "shop:Deployment:cart": {"CPUNode": {"threshold": 60}}
        }"#,
    )
    .unwrap()
}

#[test]
fn test_scan_resolves_and_evaluates_every_check() {
    let configs = overrides();
    let app = cart();

    let mut statuses = Vec::new();
    for definition in registry::registry().iter() {
        let mut check = Check::resolve(definition.id, &configs, &app).unwrap();
        match check.kind() {
            CheckKind::EventBased => check.inc(1000),
            CheckKind::ItemBased => check.add_item("item-1"),
            CheckKind::ValueBased => check.set_value(check.threshold + 1.0),
            CheckKind::Manual => check.fire(),
        }
        check.calc();
        statuses.push((definition.id, check.status, check.message.clone()));
    }

    assert_eq!(statuses.len(), registry::registry().len());
    for (id, status, message) in statuses {
        assert_eq!(status, Status::Warning, "{} should fire", id);
        assert!(!message.is_empty(), "{} should render a message", id);
        assert!(!message.contains("{{"), "{} left an unrendered action", id);
    }
}

#[test]
fn test_thresholds_follow_precedence() {
    let configs = overrides();
    let app = cart();
    let other = ApplicationId::new("billing", ApplicationKind::StatefulSet, "db");

    let ch = Check::resolve(ids::CPU_NODE, &configs, &app).unwrap();
    assert_eq!(ch.threshold, 60.0);
    assert_eq!(configs.resolve(&app, ids::CPU_NODE).tier, Tier::Application);

    let ch = Check::resolve(ids::LOG_ERRORS, &configs, &app).unwrap();
    assert_eq!(ch.threshold, 50.0);
    assert_eq!(configs.resolve(&app, ids::LOG_ERRORS).tier, Tier::Pattern);

    let ch = Check::resolve(ids::LOG_ERRORS, &configs, &other).unwrap();
    assert_eq!(ch.threshold, 5.0);
    assert_eq!(configs.resolve(&other, ids::LOG_ERRORS).tier, Tier::Global);

    let default = registry::lookup(ids::MEMORY_OOM).unwrap().default_threshold;
    let ch = Check::resolve(ids::MEMORY_OOM, &configs, &other).unwrap();
    assert_eq!(ch.threshold, default);
    assert_eq!(configs.resolve(&other, ids::MEMORY_OOM).tier, Tier::Builtin);

    let ch = Check::resolve(ids::SLO_LATENCY, &configs, &app).unwrap();
    assert_eq!(ch.threshold, 95.0);
    let ch = Check::resolve(ids::SLO_AVAILABILITY, &configs, &app).unwrap();
    assert_eq!(ch.threshold, 99.0);
}

#[test]
fn test_event_check_against_resolved_threshold() {
    let configs = overrides();

    let mut ch = Check::resolve(ids::LOG_ERRORS, &configs, &cart()).unwrap();
    ch.inc(50);
    ch.calc();
    assert_eq!(ch.status, Status::Ok);

    let mut ch = Check::resolve(ids::LOG_ERRORS, &configs, &cart()).unwrap();
    ch.inc(51);
    ch.calc();
    assert_eq!(ch.status, Status::Warning);
    assert_eq!(ch.message, "51 errors occurred");
    assert_eq!(
        registry::lookup(ids::LOG_ERRORS).unwrap().format_condition(ch.threshold),
        "the number of messages with the ERROR and CRITICAL severity levels > 50"
    );
}

#[test]
fn test_latency_slo_from_global_override() {
    let configs = overrides();
    let app = cart();

    let (cfg, used_default) = configs.get_latency(&app, &ApplicationCategory::new("application"));
    assert!(!used_default);
    assert_eq!(cfg.objective_bucket, 1.0);
    assert_eq!(cfg.objective_percentage, 95.0);

    let (cfg, used_default) = configs.get_latency(&app, &ApplicationCategory::new("monitoring"));
    assert!(!used_default);
    assert_eq!(cfg.objective_bucket, 5.0);
}

#[test]
fn test_store_swap_keeps_existing_snapshots() {
    let store = Arc::new(OverrideStore::new(overrides()));
    let before = store.snapshot();

    let mut next = CheckConfigs::new();
    next.set(ApplicationSelector::Global, ids::CPU_NODE, &SimpleThreshold::new(75.0))
        .unwrap();
    next.set(
        ApplicationSelector::from(cart()),
        ids::SLO_LATENCY,
        &vec![SloLatencyConfig {
            objective_bucket: 0.25,
            objective_percentage: 99.0,
            ..Default::default()
        }],
    )
    .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let snapshot = store.snapshot();
                let threshold = snapshot.get_simple(ids::CPU_NODE, &cart()).threshold;
                assert!(threshold == 60.0 || threshold == 75.0);
            })
        })
        .collect();
    store.replace(next);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(before.get_simple(ids::CPU_NODE, &cart()).threshold, 60.0);
    let after = store.snapshot();
    assert_eq!(after.get_simple(ids::CPU_NODE, &cart()).threshold, 75.0);
    let (latency, _) = after.get_latency(&cart(), &ApplicationCategory::new("application"));
    assert_eq!(latency.objective_bucket, 0.25);
}

#[test]
fn test_metrics_count_evaluations_and_unknown_lookups() {
    let metrics = EngineMetrics::new();
    let warnings = metrics.checks_evaluated(Status::Warning);
    let unknown = metrics.unknown_check_lookups();

    let mut ch = Check::resolve(ids::CPU_NODE, &CheckConfigs::new(), &cart()).unwrap();
    ch.add_item("node-1");
    ch.calc();
    assert!(Check::resolve("NotACheck", &CheckConfigs::new(), &cart()).is_none());

    assert!(metrics.checks_evaluated(Status::Warning) > warnings);
    assert!(metrics.unknown_check_lookups() > unknown);
}
