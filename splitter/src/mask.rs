use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// run numbers as handed out by the detector catalog
pub type RunNumber = u32;
/// lumi section numbers within one run
pub type Lumi = u32;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Lumi range start {0} lies after its end {1}")]
    InvertedRange(Lumi, Lumi),
}

/// inclusive [first, last] pair of consecutive lumi numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LumiRange(Lumi, Lumi);

impl LumiRange {
    pub fn new(first: Lumi, last: Lumi) -> Result<Self, MaskError> {
        if first > last {
            Err(MaskError::InvertedRange(first, last))
        } else {
            Ok(Self(first, last))
        }
    }

    /// range covering exactly one lumi section
    pub fn single(lumi: Lumi) -> Self {
        Self(lumi, lumi)
    }

    // constructor for bounds already known to be ordered
    pub(crate) fn ordered(first: Lumi, last: Lumi) -> Self {
        debug_assert!(first <= last);

        Self(first, last)
    }

    pub fn first(&self) -> Lumi {
        self.0
    }

    pub fn last(&self) -> Lumi {
        self.1
    }

    /// number of lumi sections covered by this range
    pub fn len(&self) -> u64 {
        u64::from(self.1 - self.0) + 1
    }

    pub fn contains(&self, lumi: Lumi) -> bool {
        self.0 <= lumi && lumi <= self.1
    }
}

impl<'de> Deserialize<'de> for LumiRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (first, last) = <(Lumi, Lumi)>::deserialize(deserializer)?;

        LumiRange::new(first, last).map_err(serde::de::Error::custom)
    }
}

/// merge an ascending sequence of lumi numbers into inclusive ranges
/// consecutive integers collapse into a single range
pub fn ranges_from_lumis<I: IntoIterator<Item = Lumi>>(lumis: I) -> Vec<LumiRange> {
    let mut ranges: Vec<LumiRange> = Vec::new();

    for lumi in lumis {
        match ranges.last_mut() {
            // NOTE: duplicates can only come from malformed catalog entries, drop them
            Some(range) if range.contains(lumi) => {}
            Some(range) if lumi == range.1 + 1 => range.1 = lumi,
            _ => ranges.push(LumiRange::single(lumi)),
        }
    }

    ranges
}

/// exact run/lumi-range description of what one job must process
///
/// The constructors are the only way to put ranges in here, so a mask is
/// always sorted ascending with non-overlapping ranges per run. Range
/// boundaries recorded by the replay store are kept as recorded; only
/// overlapping or duplicate coverage is collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Mask {
    runs: BTreeMap<RunNumber, Vec<LumiRange>>,
}

impl Mask {
    /// build a mask from per-run lumi sets, merging consecutive lumis
    pub fn from_lumi_sets<I>(sets: I) -> Self
    where
        I: IntoIterator<Item = (RunNumber, BTreeSet<Lumi>)>,
    {
        let mut mask = Self::default();

        for (run, lumis) in sets {
            mask.add_ranges(run, ranges_from_lumis(lumis));
        }

        mask
    }

    /// build a mask from already ordered per-run range lists
    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = (RunNumber, Vec<LumiRange>)>,
    {
        let mut mask = Self::default();

        for (run, ranges) in segments {
            mask.add_ranges(run, ranges);
        }

        mask
    }

    /// union ranges into one run, collapsing overlapping coverage
    pub fn add_ranges<I: IntoIterator<Item = LumiRange>>(&mut self, run: RunNumber, ranges: I) {
        let slot = self.runs.entry(run).or_default();
        slot.extend(ranges);
        slot.sort();

        let mut merged: Vec<LumiRange> = Vec::with_capacity(slot.len());
        for range in slot.drain(0..) {
            match merged.last_mut() {
                // keep recorded boundaries, only collapse actual overlap
                Some(last) if range.0 <= last.1 => last.1 = last.1.max(range.1),
                _ => merged.push(range),
            }
        }

        *slot = merged;

        if self.runs.get(&run).map(Vec::is_empty).unwrap_or(false) {
            self.runs.remove(&run);
        }
    }

    /// union another mask into this one
    pub fn union(&mut self, other: &Mask) {
        for (run, ranges) in other.iter() {
            self.add_ranges(*run, ranges.iter().copied());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RunNumber, &Vec<LumiRange>)> {
        self.runs.iter()
    }

    pub fn run_numbers(&self) -> impl Iterator<Item = &RunNumber> {
        self.runs.keys()
    }

    pub fn ranges(&self, run: RunNumber) -> Option<&[LumiRange]> {
        self.runs.get(&run).map(Vec::as_slice)
    }

    pub fn contains(&self, run: RunNumber, lumi: Lumi) -> bool {
        self.runs
            .get(&run)
            .map(|ranges| ranges.iter().any(|range| range.contains(lumi)))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// total number of lumi sections selected over all runs
    pub fn lumi_count(&self) -> u64 {
        self.runs
            .values()
            .flatten()
            .fold(0, |acc, range| acc + range.len())
    }

    /// re-expand every range back into explicit lumi numbers
    pub fn expand(&self) -> BTreeMap<RunNumber, BTreeSet<Lumi>> {
        self.runs
            .iter()
            .map(|(run, ranges)| {
                let lumis = ranges
                    .iter()
                    .flat_map(|range| range.first()..=range.last())
                    .collect();

                (*run, lumis)
            })
            .collect()
    }
}

impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<RunNumber, Vec<LumiRange>>::deserialize(deserializer)?;

        Ok(Mask::from_segments(raw))
    }
}

#[cfg(test)]
mod mask_test;
