use super::{FailureRecord, RecordMap, ReplayStores};
use crate::{
    config::{ReplayConfig, ReplayStoreConfig},
    mask::LumiRange,
};
use std::path::PathBuf;

fn range(first: u32, last: u32) -> LumiRange {
    LumiRange::new(first, last).unwrap()
}

fn memory_store() -> ReplayStores {
    let mut records = RecordMap::new();
    records.insert(
        "rereco-2026a".to_owned(),
        vec![
            FailureRecord {
                run: 1,
                ranges: vec![range(1, 2)],
            },
            FailureRecord {
                run: 1,
                ranges: vec![range(3, 3), range(11, 12)],
            },
            FailureRecord {
                run: 3,
                ranges: vec![range(20, 20)],
            },
        ],
    );

    ReplayStores::Memory(records)
}

#[test]
pub fn records_merge_per_run() {
    let mask = memory_store().failed_units("rereco-2026a").unwrap();

    // ranges from different failed jobs on the same run end up under one run,
    // recorded boundaries stay as recorded
    assert_eq!(
        mask.ranges(1).unwrap(),
        &[range(1, 2), range(3, 3), range(11, 12)]
    );
    assert_eq!(mask.ranges(3).unwrap(), &[range(20, 20)]);
    assert!(mask.ranges(2).is_none());
}

#[test]
pub fn unknown_reference_yields_an_empty_mask() {
    let mask = memory_store().failed_units("some-other-workflow").unwrap();

    assert!(mask.is_empty());
}

#[test]
pub fn unreachable_store_is_an_error() {
    let config = ReplayConfig {
        store: ReplayStoreConfig::Yaml {
            path: PathBuf::from("/definitely/not/a/replay/store.yaml"),
        },
        reference: "rereco-2026a".to_owned(),
    };

    assert!(ReplayStores::load(&config).is_err());
}

#[cfg(feature = "rusqlite")]
mod sqlite {
    use super::super::sqlite::SQLiteReplayStore;
    use super::range;

    #[test]
    pub fn round_trip_through_sqlite() {
        let store = SQLiteReplayStore::open_in_memory().unwrap();

        store.record("wf", 1, range(1, 2)).unwrap();
        store.record("wf", 1, range(2, 4)).unwrap();
        store.record("wf", 2, range(7, 7)).unwrap();
        store.record("other", 9, range(1, 1)).unwrap();

        let mask = store.failed_units("wf").unwrap();
        // overlapping records collapse in the union
        assert_eq!(mask.ranges(1).unwrap(), &[range(1, 4)]);
        assert_eq!(mask.ranges(2).unwrap(), &[range(7, 7)]);
        assert!(mask.ranges(9).is_none());

        assert!(store.failed_units("unknown").unwrap().is_empty());
        store.close().unwrap();
    }
}
