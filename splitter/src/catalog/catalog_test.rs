use super::{CatalogFile, Catalogs, Subscription};
use crate::config::CatalogConfig;
use std::path::PathBuf;

const SNAPSHOT: &str = "
workflow: rereco-2026a
name: rereco-2026a-input
files:
  - lfn: /store/data/run1/file0.root
    events: 300
    size: 1024
    locations: [T2_XX_Alpha]
    runs:
      - runNumber: 1
        lumis: [1, 2, 3]
      - run_number: 2
        lumis: [1, 1, 2]
    parents:
      - lfn: /store/raw/run1/parent0.root
        runs:
          - run_number: 1
            lumis: [1, 2, 3]
";

#[test]
pub fn snapshot_deserializes() {
    let subscription: Subscription = serde_yaml::from_str(SNAPSHOT).unwrap();

    assert_eq!(subscription.workflow, "rereco-2026a");
    assert_eq!(subscription.files.len(), 1);

    let file = &subscription.files[0];
    assert_eq!(file.events, 300);
    assert_eq!(file.lumi_count(), 5);
    assert_eq!(file.parents.len(), 1);

    let runs = file.run_lumis();
    assert_eq!(runs[&1].len(), 3);
    // duplicate lumis in the raw entry collapse in the set
    assert_eq!(runs[&2].len(), 2);
}

#[test]
pub fn without_parents_strips_the_payload_only() {
    let subscription: Subscription = serde_yaml::from_str(SNAPSHOT).unwrap();
    let file = subscription.files[0].without_parents();

    assert!(file.parents.is_empty());
    assert_eq!(file.lfn, subscription.files[0].lfn);
    assert_eq!(file.runs, subscription.files[0].runs);
}

#[test]
pub fn missing_snapshot_fails_to_load() {
    let config = CatalogConfig::Yaml {
        path: PathBuf::from("/definitely/not/a/catalog.yaml"),
    };

    assert!(Catalogs::load(&config).is_err());
}

#[test]
pub fn memory_catalog_round_trips() {
    let subscription = Subscription {
        workflow: "wf".to_owned(),
        name: "wf-input".to_owned(),
        files: vec![CatalogFile {
            lfn: "/store/file".to_owned(),
            events: 0,
            size: 0,
            locations: Default::default(),
            parents: Vec::new(),
            runs: Vec::new(),
        }],
    };

    let catalog = Catalogs::Memory(subscription.clone());
    assert_eq!(catalog.subscription().unwrap(), subscription);
}
