//! Tests for search configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        random_seed = 42
        thread_count = "auto"

        [stop]
        type = "no_improvement"
        max_iterations = 500
        iterations_no_improv = 20
        tolerance = 0.001

        [acceptance]
        type = "threshold"
        t_start = 0.1
        t_end = 0.0
        iter_max = 500

        [pool]
        type = "elite"
        limit = 8

        [selection]
        strategy = "probability"
        circular = true
        weights = [1.0, 3.0]
    "#;

    let config = SearchConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.thread_count, ThreadCount::Auto);
    let StopConfig::NoImprovement(stop) = &config.stop else {
        panic!("expected no_improvement stop, got {:?}", config.stop);
    };
    assert_eq!(stop.iterations_no_improv, 20);
    assert_eq!(stop.max_iterations, Some(500));
    assert_eq!(
        config.acceptance,
        AcceptanceConfig::Threshold(ScheduleConfig {
            t_start: 0.1,
            t_end: 0.0,
            iter_max: 500,
        })
    );
    assert_eq!(config.pool, PoolConfig::Elite(EliteConfig { limit: 8 }));
    assert_eq!(config.selection.strategy, SelectionStrategyConfig::Probability);
    assert!(config.selection.circular);
    assert_eq!(config.selection.weight(1), 3.0);
    assert_eq!(config.selection.weight(2), 1.0);
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        random_seed: 42
        thread_count:
          specific: 2
        stop:
          type: time_iteration
          time_limit_ms: 1500
        acceptance:
          type: better_unknown
          fixed_percent: 0.2
        pool:
          type: elite_diverse
          limit: 5
          diversity_weight: 0.25
    "#;

    let config = SearchConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.thread_count.resolve(), 2);
    assert_eq!(config.stop.time_limit(), Some(Duration::from_millis(1500)));
    assert_eq!(
        config.acceptance,
        AcceptanceConfig::BetterUnknown(BetterUnknownConfig {
            fixed_percent: Some(0.2),
            log_factor: None,
        })
    );
}

#[test]
fn test_defaults() {
    let config = SearchConfig::from_toml_str("").unwrap();
    assert_eq!(config, SearchConfig::default());
    assert_eq!(config.acceptance, AcceptanceConfig::Better);
    assert_eq!(config.pool, PoolConfig::List);
    assert_eq!(config.stop.time_limit(), None);
    assert!(config.thread_count.resolve() >= 1);
}

#[test]
fn test_thread_count_forms() {
    for yaml in ["thread_count: auto", "thread_count: 3", "thread_count:\n  specific: 3"] {
        let config = SearchConfig::from_yaml_str(yaml).unwrap();
        let expected = if yaml.contains("auto") {
            ThreadCount::Auto
        } else {
            ThreadCount::Specific(3)
        };
        assert_eq!(config.thread_count, expected, "{}", yaml);
    }
    for toml in [
        "thread_count = \"auto\"",
        "thread_count = 3",
        "thread_count = { specific = 3 }",
    ] {
        let config = SearchConfig::from_toml_str(toml).unwrap();
        let expected = if toml.contains("auto") {
            ThreadCount::Auto
        } else {
            ThreadCount::Specific(3)
        };
        assert_eq!(config.thread_count, expected, "{}", toml);
    }
}

#[test]
fn test_thread_count_round_trips_through_yaml() {
    let config = SearchConfig::new().with_thread_count(ThreadCount::Specific(4));
    let yaml = serde_yaml::to_string(&config).unwrap();
    assert_eq!(SearchConfig::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn test_rejects_zero_threads() {
    let err = SearchConfig::from_toml_str("thread_count = { specific = 0 }").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_rejects_negative_weight() {
    let toml = r#"
        [selection]
        weights = [1.0, -2.0]
    "#;
    let err = SearchConfig::from_toml_str(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_unknown_acceptance_type_fails() {
    let toml = r#"
        [acceptance]
        type = "tabu"
    "#;
    assert!(matches!(
        SearchConfig::from_toml_str(toml),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = SearchConfig::load("/nonexistent/metaforge/search.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_builder() {
    let config = SearchConfig::new()
        .with_random_seed(123)
        .with_thread_count(ThreadCount::Specific(3))
        .with_time_limit_ms(250)
        .with_acceptance(AcceptanceConfig::BetterOrSame)
        .with_pool(PoolConfig::Elite(EliteConfig { limit: 4 }));

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.thread_count.resolve(), 3);
    assert_eq!(config.stop.time_limit(), Some(Duration::from_millis(250)));
    assert_eq!(config.acceptance, AcceptanceConfig::BetterOrSame);
}
