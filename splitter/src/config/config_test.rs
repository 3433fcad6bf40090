use super::SplitConfig;

const CONFIG: &str = "
catalog:
  Yaml:
    path: snapshot.yaml
replay:
  store:
    Yaml:
      path: failures.yaml
  reference: rereco-2026a
split:
  algorithm: event_aware
  eventsPerJob: 360
  maxEventsPerLumi: 20000
  runWhitelist: [1, 2, 3]
  performance:
    timePerEvent: 12.0
    sizePerEvent: 400.0
    memoryRequirement: 2300.0
";

#[test]
pub fn camel_case_aliases_parse() {
    let mut config: SplitConfig = serde_yaml::from_str(CONFIG).unwrap();

    assert_eq!(config.split.events_per_job, Some(360));
    assert_eq!(config.split.max_events_per_lumi, Some(20000));
    assert_eq!(config.split.run_whitelist.as_ref().unwrap().len(), 3);
    assert_eq!(config.split.performance.time_per_event, 12.0);
    // defaults from the policy table
    assert!(!config.split.halt_on_file_boundary);
    assert!(config.split.split_on_run);
    assert!(!config.split.include_parents);

    assert!(!config.preflight_checks());
}

#[test]
pub fn unknown_fields_are_rejected() {
    let raw = CONFIG.replace("eventsPerJob", "eventsPerJob2");

    assert!(serde_yaml::from_str::<SplitConfig>(&raw).is_err());
}

#[test]
pub fn missing_budget_fails_preflight() {
    let raw = "
catalog:
  Yaml:
    path: snapshot.yaml
split:
  algorithm: lumi_based
";
    let mut config: SplitConfig = serde_yaml::from_str(raw).unwrap();

    assert!(config.preflight_checks());
}

#[test]
pub fn unsupported_algorithm_fails_preflight() {
    let raw = "
catalog:
  Yaml:
    path: snapshot.yaml
split:
  algorithm: file_based
  lumisPerJob: 5
";
    let mut config: SplitConfig = serde_yaml::from_str(raw).unwrap();

    assert!(config.preflight_checks());
}

#[test]
pub fn algorithm_name_is_normalized() {
    let raw = "
catalog:
  Yaml:
    path: snapshot.yaml
split:
  algorithm: Lumi_Based
  lumisPerJob: 2
";
    let mut config: SplitConfig = serde_yaml::from_str(raw).unwrap();

    assert!(!config.preflight_checks());
    assert_eq!(config.split.algorithm, "lumi_based");
}
