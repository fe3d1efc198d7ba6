//! Tests for override resolution and typed accessors
//!
//! Documents are built in memory; every tier is exercised against the
//! built-in registry defaults.

#[cfg(test)]
mod resolution_tests {
    use crate::models::{ApplicationId, ApplicationKind};
    use crate::observability::EngineMetrics;
    use crate::overrides::{
        ApplicationSelector, CheckConfigs, RawPayload, SimpleThreshold, Tier,
    };
    use crate::registry::{ids, lookup};

    fn cart() -> ApplicationId {
        ApplicationId::new("shop", ApplicationKind::Deployment, "cart")
    }

    fn threshold(value: f32) -> SimpleThreshold {
        SimpleThreshold::new(value)
    }

    /// Overrides for CPUNode at every tier
    fn layered_configs() -> CheckConfigs {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::Global, ids::CPU_NODE, &threshold(70.0))
            .unwrap();
        configs
            .set(ApplicationSelector::pattern("shop:*"), ids::CPU_NODE, &threshold(60.0))
            .unwrap();
        configs
            .set(ApplicationSelector::App(cart()), ids::CPU_NODE, &threshold(50.0))
            .unwrap();
        configs
    }

    #[test]
    fn test_no_override_uses_builtin_default() {
        let configs = CheckConfigs::new();
        for app in [cart(), ApplicationId::zero()] {
            let resolution = configs.resolve(&app, ids::STORAGE_SPACE);
            assert!(resolution.used_builtin());
            assert!(!resolution.is_global_default());
            assert!(resolution.payload.is_none());
            assert_eq!(
                configs.get_simple(ids::STORAGE_SPACE, &app).threshold,
                lookup(ids::STORAGE_SPACE).unwrap().default_threshold
            );
        }
    }

    #[test]
    fn test_precedence_falls_through_tiers() {
        let mut configs = layered_configs();
        let app = cart();

        let resolution = configs.resolve(&app, ids::CPU_NODE);
        assert_eq!(resolution.tier, Tier::Application);
        assert!(!resolution.is_global_default());
        assert_eq!(configs.get_simple(ids::CPU_NODE, &app).threshold, 50.0);

        configs.remove(&ApplicationSelector::App(app.clone()), ids::CPU_NODE);
        let resolution = configs.resolve(&app, ids::CPU_NODE);
        assert_eq!(resolution.tier, Tier::Pattern);
        assert!(!resolution.is_global_default());
        assert_eq!(configs.get_simple(ids::CPU_NODE, &app).threshold, 60.0);

        configs.remove(&ApplicationSelector::pattern("shop:*"), ids::CPU_NODE);
        let resolution = configs.resolve(&app, ids::CPU_NODE);
        assert_eq!(resolution.tier, Tier::Global);
        assert!(resolution.is_global_default());
        assert_eq!(configs.get_simple(ids::CPU_NODE, &app).threshold, 70.0);

        configs.remove(&ApplicationSelector::Global, ids::CPU_NODE);
        let resolution = configs.resolve(&app, ids::CPU_NODE);
        assert_eq!(resolution.tier, Tier::Builtin);
        assert!(resolution.used_builtin());
        assert_eq!(configs.get_simple(ids::CPU_NODE, &app).threshold, 80.0);
        assert!(configs.is_empty());
    }

    #[test]
    fn test_override_for_other_check_is_ignored() {
        let configs = layered_configs();
        let resolution = configs.resolve(&cart(), ids::CPU_CONTAINER);
        assert!(resolution.used_builtin());
    }

    #[test]
    fn test_pattern_does_not_match_other_namespace() {
        let configs = layered_configs();
        let other = ApplicationId::new("billing", ApplicationKind::Deployment, "cart");
        let resolution = configs.resolve(&other, ids::CPU_NODE);
        assert_eq!(resolution.tier, Tier::Global);
        assert_eq!(configs.get_simple(ids::CPU_NODE, &other).threshold, 70.0);
    }

    #[test]
    fn test_multiple_patterns_resolve_deterministically() {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::pattern("shop:Deployment:*"), ids::CPU_NODE, &threshold(65.0))
            .unwrap();
        configs
            .set(ApplicationSelector::pattern("*:Deployment:cart"), ids::CPU_NODE, &threshold(55.0))
            .unwrap();

        for _ in 0..10 {
            let resolution = configs.resolve(&cart(), ids::CPU_NODE);
            assert_eq!(resolution.tier, Tier::Pattern);
            assert_eq!(resolution.selector.unwrap().to_string(), "*:Deployment:cart");
        }
        assert_eq!(configs.get_simple(ids::CPU_NODE, &cart()).threshold, 55.0);
    }

    #[test]
    fn test_zero_application_only_sees_global() {
        let mut configs = layered_configs();
        configs
            .set(ApplicationSelector::pattern("*"), ids::CPU_CONTAINER, &threshold(10.0))
            .unwrap();
        let zero = ApplicationId::zero();
        let resolution = configs.resolve(&zero, ids::CPU_NODE);
        assert_eq!(resolution.tier, Tier::Application);
        assert_eq!(resolution.selector, Some(&ApplicationSelector::Global));
        assert_eq!(configs.get_simple(ids::CPU_NODE, &zero).threshold, 70.0);
        assert!(configs.resolve(&zero, ids::CPU_CONTAINER).used_builtin());
    }

    #[test]
    fn test_zero_application_own_key_is_not_global_default() {
        let configs = layered_configs();
        let resolution = configs.resolve(&ApplicationId::zero(), ids::CPU_NODE);
        assert!(!resolution.is_global_default());
        assert!(!resolution.used_builtin());

        let resolution = configs.resolve(&cart(), ids::CPU_CONTAINER);
        assert!(resolution.used_builtin());
    }

    #[test]
    fn test_malformed_payload_falls_back_to_default() {
        let failures = EngineMetrics::new().override_decode_failures();
        let mut configs = CheckConfigs::new();
        configs.insert_raw(
            ApplicationSelector::App(cart()),
            ids::CPU_NODE,
            RawPayload::new("{\"threshold\": "),
        );
        configs.insert_raw(
            ApplicationSelector::Global,
            ids::STORAGE_SPACE,
            RawPayload::new("{\"threshold\": \"high\"}"),
        );

        assert_eq!(
            configs.get_simple(ids::CPU_NODE, &cart()),
            CheckConfigs::new().get_simple(ids::CPU_NODE, &cart())
        );
        assert_eq!(configs.get_simple(ids::STORAGE_SPACE, &cart()).threshold, 80.0);
        assert!(EngineMetrics::new().override_decode_failures() >= failures + 2);
    }

    #[test]
    fn test_malformed_payload_is_counted_by_every_accessor() {
        let mut configs = CheckConfigs::new();
        configs.insert_raw(ApplicationSelector::Global, ids::CPU_NODE, RawPayload::new("{"));
        configs.insert_raw(
            ApplicationSelector::App(cart()),
            ids::SLO_AVAILABILITY,
            RawPayload::new("[{\"objective_percentage\": \"high\"}]"),
        );
        let metrics = EngineMetrics::new();

        let before = metrics.override_decode_failures();
        assert_eq!(configs.get_simple(ids::CPU_NODE, &cart()).threshold, 80.0);
        let after_simple = metrics.override_decode_failures();
        assert!(after_simple > before);

        assert_eq!(configs.get_simple_all(ids::CPU_NODE, &cart())[1], None);
        let after_all = metrics.override_decode_failures();
        assert!(after_all > after_simple);

        let (cfg, used_default) = configs.get_availability(&cart());
        assert!(used_default);
        assert_eq!(cfg.objective_percentage, 99.0);
        assert!(metrics.override_decode_failures() > after_all);
    }

    #[test]
    fn test_simple_threshold_roundtrip() {
        for value in [0.0_f32, 0.005, 42.5, 99.95, 1e6] {
            let mut configs = CheckConfigs::new();
            configs
                .set(ApplicationSelector::App(cart()), ids::REDIS_LATENCY, &threshold(value))
                .unwrap();
            assert_eq!(configs.get_simple(ids::REDIS_LATENCY, &cart()).threshold, value);
        }
    }

    #[test]
    fn test_unknown_check_returns_zero_value() {
        let configs = layered_configs();
        assert_eq!(configs.get_simple("NoSuchCheck", &cart()), SimpleThreshold::default());
        assert!(configs.get_simple_all("NoSuchCheck", &cart()).is_empty());
        assert!(configs.by_check("NoSuchCheck").is_empty());
    }

    #[test]
    fn test_get_simple_all_for_app() {
        let configs = layered_configs();
        let all = configs.get_simple_all(ids::CPU_NODE, &cart());
        assert_eq!(all, vec![Some(threshold(80.0)), Some(threshold(70.0)), Some(threshold(50.0))]);
    }

    #[test]
    fn test_get_simple_all_for_zero_app() {
        let configs = layered_configs();
        let all = configs.get_simple_all(ids::CPU_NODE, &ApplicationId::zero());
        assert_eq!(all, vec![Some(threshold(80.0)), Some(threshold(70.0))]);
    }

    #[test]
    fn test_get_simple_all_ignores_patterns_and_bad_payloads() {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::pattern("shop:*"), ids::CPU_NODE, &threshold(60.0))
            .unwrap();
        configs.insert_raw(ApplicationSelector::Global, ids::CPU_NODE, RawPayload::new("not json"));
        let all = configs.get_simple_all(ids::CPU_NODE, &cart());
        assert_eq!(all, vec![Some(threshold(80.0)), None, None]);
    }
}

#[cfg(test)]
mod slo_tests {
    use crate::models::{ApplicationCategory, ApplicationId, ApplicationKind};
    use crate::overrides::{
        ApplicationSelector, CheckConfigs, ConfigSource, RawPayload, ResolvedConfig,
        SimpleThreshold, SloAvailabilityConfig, SloLatencyConfig,
    };
    use crate::registry::ids;
    use crate::settings::SloSettings;

    fn cart() -> ApplicationId {
        ApplicationId::new("shop", ApplicationKind::Deployment, "cart")
    }

    fn external() -> ApplicationId {
        ApplicationId::new("external", ApplicationKind::ExternalService, "payments-api")
    }

    fn primary() -> ApplicationCategory {
        ApplicationCategory::new(ApplicationCategory::APPLICATION)
    }

    fn monitoring() -> ApplicationCategory {
        ApplicationCategory::new(ApplicationCategory::MONITORING)
    }

    fn latency(bucket: f32, objective: f32) -> SloLatencyConfig {
        SloLatencyConfig {
            custom: true,
            histogram_query: "http_request_duration_seconds_bucket".to_string(),
            objective_bucket: bucket,
            objective_percentage: objective,
            ..Default::default()
        }
    }

    #[test]
    fn test_availability_default() {
        let (cfg, used_default) = CheckConfigs::new().get_availability(&cart());
        assert!(used_default);
        assert!(!cfg.custom);
        assert_eq!(cfg.objective_percentage, 99.0);
    }

    #[test]
    fn test_availability_external_service_has_no_objective() {
        let (cfg, used_default) = CheckConfigs::new().get_availability(&external());
        assert!(used_default);
        assert_eq!(cfg.objective_percentage, 0.0);
    }

    #[test]
    fn test_availability_first_element_wins() {
        let mut configs = CheckConfigs::new();
        let first = SloAvailabilityConfig {
            custom: true,
            total_requests_query: "requests_total".to_string(),
            failed_requests_query: "requests_failed_total".to_string(),
            objective_percentage: 99.9,
            source: Some(ConfigSource::KubernetesAnnotations),
            error: String::new(),
        };
        let second = SloAvailabilityConfig {
            objective_percentage: 50.0,
            ..first.clone()
        };
        configs
            .set(ApplicationSelector::App(cart()), ids::SLO_AVAILABILITY, &vec![first.clone(), second])
            .unwrap();

        let (cfg, used_default) = configs.get_availability(&cart());
        assert!(!used_default);
        assert_eq!(cfg, first);
        assert_eq!(cfg.total(), "sum(rate(requests_total[$RANGE]))");
    }

    #[test]
    fn test_availability_empty_list_uses_default() {
        let mut configs = CheckConfigs::new();
        configs.insert_raw(ApplicationSelector::App(cart()), ids::SLO_AVAILABILITY, RawPayload::new("[]"));
        let (cfg, used_default) = configs.get_availability(&cart());
        assert!(used_default);
        assert_eq!(cfg.objective_percentage, 99.0);
    }

    #[test]
    fn test_availability_malformed_matches_no_override() {
        let mut configs = CheckConfigs::new();
        configs.insert_raw(ApplicationSelector::App(external()), ids::SLO_AVAILABILITY, RawPayload::new("{"));
        assert_eq!(
            configs.get_availability(&external()),
            CheckConfigs::new().get_availability(&external())
        );
    }

    #[test]
    fn test_latency_defaults_by_category() {
        let configs = CheckConfigs::new();
        let (cfg, used_default) = configs.get_latency(&cart(), &primary());
        assert!(used_default);
        assert_eq!(cfg.objective_bucket, 0.5);
        assert_eq!(cfg.objective_percentage, 99.0);

        let (cfg, used_default) = configs.get_latency(&cart(), &monitoring());
        assert!(used_default);
        assert_eq!(cfg.objective_bucket, 5.0);
    }

    #[test]
    fn test_latency_external_service_has_no_objective() {
        let (cfg, _) = CheckConfigs::new().get_latency(&external(), &primary());
        assert_eq!(cfg.objective_percentage, 0.0);
    }

    #[test]
    fn test_latency_global_override_keeps_auxiliary_bucket() {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::Global, ids::SLO_LATENCY, &vec![latency(0.2, 95.0)])
            .unwrap();

        let (cfg, used_default) = configs.get_latency(&cart(), &monitoring());
        assert!(!used_default);
        assert_eq!(cfg.objective_bucket, 5.0);
        assert_eq!(cfg.objective_percentage, 95.0);
        assert!(cfg.custom);

        let (cfg, _) = configs.get_latency(&cart(), &primary());
        assert_eq!(cfg.objective_bucket, 0.2);
    }

    #[test]
    fn test_latency_zero_application_keeps_its_own_bucket() {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::Global, ids::SLO_LATENCY, &vec![latency(0.2, 95.0)])
            .unwrap();

        let zero = ApplicationId::zero();
        assert!(!configs.resolve(&zero, ids::SLO_LATENCY).is_global_default());
        let (cfg, used_default) = configs.get_latency(&zero, &monitoring());
        assert!(!used_default);
        assert_eq!(cfg.objective_bucket, 0.2);
        assert_eq!(cfg.objective_percentage, 95.0);
    }

    #[test]
    fn test_latency_app_override_wins_for_auxiliary() {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::App(cart()), ids::SLO_LATENCY, &vec![latency(0.1, 99.5)])
            .unwrap();
        let (cfg, used_default) = configs.get_latency(&cart(), &monitoring());
        assert!(!used_default);
        assert_eq!(cfg.objective_bucket, 0.1);
    }

    #[test]
    fn test_latency_custom_settings() {
        let settings = SloSettings {
            objective_bucket: 0.25,
            auxiliary_objective_bucket: 2.0,
        };
        let configs = CheckConfigs::new();
        let (cfg, _) = configs.get_latency_with(&cart(), &primary(), &settings);
        assert_eq!(cfg.objective_bucket, 0.25);
        let (cfg, _) = configs.get_latency_with(&cart(), &monitoring(), &settings);
        assert_eq!(cfg.objective_bucket, 2.0);
    }

    #[test]
    fn test_by_check_decodes_declared_shapes() {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::Global, ids::SLO_LATENCY, &vec![latency(0.3, 99.0)])
            .unwrap();
        configs
            .set(ApplicationSelector::App(cart()), ids::SLO_LATENCY, &vec![latency(0.1, 95.0)])
            .unwrap();
        configs
            .set(ApplicationSelector::App(cart()), ids::CPU_NODE, &SimpleThreshold::new(90.0))
            .unwrap();
        configs.insert_raw(ApplicationSelector::pattern("ops:*"), ids::SLO_LATENCY, RawPayload::new("{}"));

        let latency_configs = configs.by_check(ids::SLO_LATENCY);
        assert_eq!(latency_configs.len(), 2);
        assert_eq!(
            latency_configs[&ApplicationSelector::Global],
            vec![ResolvedConfig::Latency(latency(0.3, 99.0))]
        );

        let cpu = configs.by_check(ids::CPU_NODE);
        assert_eq!(
            cpu[&ApplicationSelector::App(cart())],
            vec![ResolvedConfig::Simple(SimpleThreshold::new(90.0))]
        );
    }
}

#[cfg(test)]
mod store_tests {
    use std::sync::Arc;
    use std::thread;

    use crate::models::{ApplicationId, ApplicationKind};
    use crate::overrides::{ApplicationSelector, CheckConfigs, OverrideStore, SimpleThreshold};
    use crate::registry::ids;

    fn configs_with(threshold: f32) -> CheckConfigs {
        let mut configs = CheckConfigs::new();
        configs
            .set(ApplicationSelector::Global, ids::CPU_NODE, &SimpleThreshold::new(threshold))
            .unwrap();
        configs
    }

    #[test]
    fn test_snapshot_is_stable_across_replace() {
        let store = OverrideStore::new(configs_with(70.0));
        let app = ApplicationId::new("shop", ApplicationKind::Deployment, "cart");

        let snapshot = store.snapshot();
        let previous = store.replace(configs_with(60.0));

        assert!(Arc::ptr_eq(&snapshot, &previous));
        assert_eq!(snapshot.get_simple(ids::CPU_NODE, &app).threshold, 70.0);
        assert_eq!(store.snapshot().get_simple(ids::CPU_NODE, &app).threshold, 60.0);
    }

    #[test]
    fn test_concurrent_readers_see_whole_documents() {
        let store = Arc::new(OverrideStore::default());
        let app = ApplicationId::new("shop", ApplicationKind::Deployment, "cart");

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let app = app.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let threshold = store.snapshot().get_simple(ids::CPU_NODE, &app).threshold;
                        assert!([80.0, 10.0, 20.0].contains(&threshold));
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let threshold = if i % 2 == 0 { 10.0 } else { 20.0 };
            store.replace(configs_with(threshold));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_document_json_shape() {
        let json = r#"{
            "": {"CPUNode": {"threshold": 70}},
            "shop:*": {"CPUNode": {"threshold": 60}},
            "shop:Deployment:cart": {"SLOAvailability": [{"custom": false, "objective_percentage": 99.5}]}
        }"#;
        let configs: CheckConfigs = serde_json::from_str(json).unwrap();
        let app = ApplicationId::new("shop", ApplicationKind::Deployment, "cart");
        assert_eq!(configs.get_simple(ids::CPU_NODE, &app).threshold, 60.0);
        let (availability, used_default) = configs.get_availability(&app);
        assert!(!used_default);
        assert_eq!(availability.objective_percentage, 99.5);

        let encoded = serde_json::to_string(&configs).unwrap();
        let decoded: CheckConfigs = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, configs);
    }
}
