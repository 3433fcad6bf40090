use crate::{
    catalog::CatalogFile,
    mask::{ranges_from_lumis, Lumi, LumiRange, Mask, RunNumber},
};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// one input file restricted to the run/lumi space a split may draw from
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleFile {
    pub file: CatalogFile,
    /// eligible coverage as ordered, non-overlapping ranges per run
    pub runs: BTreeMap<RunNumber, Vec<LumiRange>>,
}

impl EligibleFile {
    pub fn lumi_count(&self) -> u64 {
        self.runs
            .values()
            .flatten()
            .fold(0, |acc, range| acc + range.len())
    }

    /// the eligible space of this file as a mask
    pub fn mask(&self) -> Mask {
        Mask::from_segments(self.runs.clone())
    }
}

/// compute the run/lumi universe a split is allowed to draw from
///
/// Without restrictions this is every (run, lumi) pair present in any input
/// file. A run whitelist drops whole runs; a replay mask keeps only units
/// previously recorded as failed, preserving the recorded range boundaries.
/// Files left with zero eligible lumis are dropped entirely.
pub fn resolve(
    files: &[CatalogFile],
    run_whitelist: Option<&BTreeSet<RunNumber>>,
    replay: Option<&Mask>,
) -> Vec<EligibleFile> {
    let mut eligible = Vec::new();

    // stable deterministic order, independent of how the catalog lists files
    for file in files.iter().sorted_by(|a, b| a.lfn.cmp(&b.lfn)) {
        let mut runs: BTreeMap<RunNumber, Vec<LumiRange>> = BTreeMap::new();

        for (run, lumis) in file.run_lumis() {
            if let Some(whitelist) = run_whitelist {
                if !whitelist.contains(&run) {
                    continue;
                }
            }

            let ranges = match replay {
                Some(failed) => match failed.ranges(run) {
                    Some(recorded) => restrict_to_recorded(recorded, &lumis),
                    // runs never recorded as failed are not eligible
                    None => continue,
                },
                None => ranges_from_lumis(lumis),
            };

            if !ranges.is_empty() {
                runs.insert(run, ranges);
            }
        }

        if runs.is_empty() {
            debug!(lfn = %file.lfn, "Dropped file with no eligible lumis");

            continue;
        }

        eligible.push(EligibleFile {
            file: file.clone(),
            runs,
        });
    }

    eligible
}

/// intersect a file's lumis with the recorded failed ranges
/// boundaries between recorded ranges survive, gaps in the file split further
fn restrict_to_recorded(recorded: &[LumiRange], lumis: &BTreeSet<Lumi>) -> Vec<LumiRange> {
    let mut ranges = Vec::new();

    for record in recorded {
        ranges.extend(ranges_from_lumis(
            lumis.range(record.first()..=record.last()).copied(),
        ));
    }

    ranges
}
