use super::{ranges_from_lumis, LumiRange, Mask};
use std::collections::BTreeSet;

fn range(first: u32, last: u32) -> LumiRange {
    LumiRange::new(first, last).unwrap()
}

fn lumi_set(lumis: &[u32]) -> BTreeSet<u32> {
    lumis.iter().copied().collect()
}

#[test]
pub fn merge_consecutive() {
    assert_eq!(ranges_from_lumis([0, 1, 2]), vec![range(0, 2)]);
    assert_eq!(ranges_from_lumis([0, 1, 3]), vec![range(0, 1), range(3, 3)]);
    assert_eq!(ranges_from_lumis([7]), vec![range(7, 7)]);
    assert_eq!(ranges_from_lumis([]), Vec::new());
}

#[test]
pub fn inverted_range_is_rejected() {
    assert!(LumiRange::new(5, 4).is_err());
    assert!(LumiRange::new(4, 4).is_ok());
}

#[test]
pub fn expand_restores_the_input_set() {
    for lumis in [
        lumi_set(&[0, 1, 2, 3]),
        lumi_set(&[1, 3, 5, 7]),
        lumi_set(&[10, 11, 13, 14, 15, 20]),
        lumi_set(&[u32::MAX - 1, u32::MAX]),
        lumi_set(&[]),
    ] {
        let mask = Mask::from_lumi_sets([(1, lumis.clone())]);

        let expanded = mask.expand().remove(&1).unwrap_or_default();
        assert_eq!(expanded, lumis);
        assert_eq!(mask.lumi_count(), lumis.len() as u64);

        // ranges must come out sorted and non-overlapping
        if let Some(ranges) = mask.ranges(1) {
            for pair in ranges.windows(2) {
                assert!(pair[0].last() < pair[1].first());
            }
        }
    }
}

#[test]
pub fn union_collapses_overlap_only() {
    let mut mask = Mask::default();
    mask.add_ranges(1, [range(1, 2)]);
    mask.add_ranges(1, [range(3, 3)]);
    mask.add_ranges(1, [range(11, 12)]);

    // adjacent recorded boundaries stay as recorded
    assert_eq!(
        mask.ranges(1).unwrap(),
        &[range(1, 2), range(3, 3), range(11, 12)]
    );

    // overlapping coverage from another record collapses
    mask.add_ranges(1, [range(2, 3), range(11, 11)]);
    assert_eq!(mask.ranges(1).unwrap(), &[range(1, 3), range(11, 12)]);
}

#[test]
pub fn union_of_masks() {
    let mut first = Mask::from_segments([(1, vec![range(1, 4)])]);
    let second = Mask::from_segments([(1, vec![range(3, 6)]), (2, vec![range(9, 9)])]);

    first.union(&second);

    assert_eq!(first.ranges(1).unwrap(), &[range(1, 6)]);
    assert_eq!(first.ranges(2).unwrap(), &[range(9, 9)]);
}

#[test]
pub fn contains_lookup() {
    let mask = Mask::from_lumi_sets([(4, lumi_set(&[100, 101, 103]))]);

    assert!(mask.contains(4, 100));
    assert!(mask.contains(4, 103));
    assert!(!mask.contains(4, 102));
    assert!(!mask.contains(5, 100));
}

#[test]
pub fn deserialized_masks_are_normalized() {
    let mask: Mask = serde_yaml::from_str("1:\n  - [1, 3]\n  - [2, 5]\n").unwrap();

    assert_eq!(mask.ranges(1).unwrap(), &[range(1, 5)]);

    // an inverted pair must not deserialize into a mask
    assert!(serde_yaml::from_str::<Mask>("1:\n  - [5, 2]\n").is_err());
}

#[test]
pub fn empty_lumi_sets_leave_no_run_behind() {
    let mask = Mask::from_lumi_sets([(1, lumi_set(&[])), (2, lumi_set(&[7]))]);

    assert!(mask.ranges(1).is_none());
    assert_eq!(mask.run_numbers().collect::<Vec<_>>(), vec![&2]);
}
