use cadence_scheduler::{Priority, SchedulerConfig, SchedulerError, infer_priority};

#[test]
fn test_defaults() {
    let config = SchedulerConfig::default();
    assert_eq!(config.update_window, 50.0);
    assert_eq!(config.urgent_threshold, 100.0);
    assert_eq!(config.slice_budget, 5.0);
    assert_eq!(config.yield_delay, 5.0);
    assert_eq!(config.default_timeout, 5000.0);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = SchedulerConfig::from_json(r#"{ "update_window": 20, "slice_budget": 8.5 }"#).unwrap();
    assert_eq!(config.update_window, 20.0);
    assert_eq!(config.slice_budget, 8.5);
    assert_eq!(config.urgent_threshold, 100.0);
}

#[test]
fn test_rejects_bad_json_and_negative_spans() {
    assert!(matches!(
        SchedulerConfig::from_json("{ not json"),
        Err(SchedulerError::Config(_))
    ));
    assert!(matches!(
        SchedulerConfig::from_json(r#"{ "default_timeout": -1 }"#),
        Err(SchedulerError::InvalidTimeout(_))
    ));
}

#[test]
fn test_round_trips_through_json() {
    let config = SchedulerConfig {
        yield_delay: 2.0,
        ..SchedulerConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(SchedulerConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_priority_inference_bands() {
    assert_eq!(infer_priority(100.0, 100.0, 100.0), Priority::Immediate);
    assert_eq!(infer_priority(90.0, 100.0, 100.0), Priority::Immediate);
    assert_eq!(infer_priority(150.0, 100.0, 100.0), Priority::Normal);
    assert_eq!(infer_priority(200.0, 100.0, 100.0), Priority::Normal);
    assert_eq!(infer_priority(200.5, 100.0, 100.0), Priority::Low);
}

#[test]
fn test_priority_order_and_levels() {
    assert!(Priority::Immediate > Priority::Normal);
    assert!(Priority::Normal > Priority::Low);
    for priority in [Priority::Low, Priority::Normal, Priority::Immediate] {
        assert_eq!(Priority::from_level(priority.level()), Some(priority));
    }
    assert_eq!(Priority::from_level(0), None);
}
