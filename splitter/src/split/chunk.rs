use crate::{
    catalog::CatalogFile,
    eligible::EligibleFile,
    job::Job,
    mask::{Lumi, LumiRange, Mask, RunNumber},
    perf::{self, PerformanceProfile},
};
use std::collections::BTreeMap;
use std::mem;
use tracing::trace;

/// boundary rules a chunk must not cross
/// file boundary is outermost, run boundary is enforced within a file
#[derive(Debug, Clone, Copy)]
pub(crate) struct Boundaries {
    pub halt_on_file_boundary: bool,
    pub split_on_run: bool,
}

/// sizing budget while walking the lumis of one file
#[derive(Debug, Clone)]
pub(crate) struct FileBudget {
    /// lumis a chunk may hold while drawing from this file, u64::MAX means unconstrained
    pub lumis: u64,
    /// event rate used to account assigned events, 0.0 for no estimate
    pub events_per_lumi: f64,
    /// set when a single lumi of this file overruns the hard event cap
    pub flagged: Option<String>,
}

/// one accumulating chunk: per-run lumi selections plus the contributing files
#[derive(Debug, Clone, Default)]
pub(crate) struct Chunk {
    segments: BTreeMap<RunNumber, Vec<LumiRange>>,
    files: Vec<CatalogFile>,
    lumi_count: u64,
    assigned_events: f64,
    flagged: Option<String>,
    current_run: Option<RunNumber>,
    current_lfn: Option<String>,
}

impl Chunk {
    fn is_empty(&self) -> bool {
        self.lumi_count == 0
    }

    fn push(&mut self, file: &CatalogFile, run: RunNumber, range: LumiRange, budget: &FileBudget) {
        self.segments.entry(run).or_default().push(range);
        self.lumi_count += range.len();
        self.assigned_events += budget.events_per_lumi * range.len() as f64;

        // files are visited contiguously, checking the tail is enough to de-duplicate
        if self.current_lfn.as_deref() != Some(file.lfn.as_str()) {
            self.files.push(file.clone());
        }
        if self.flagged.is_none() {
            self.flagged = budget.flagged.clone();
        }

        self.current_run = Some(run);
        self.current_lfn = Some(file.lfn.clone());
    }

    /// package a closed chunk into a job
    pub(crate) fn into_job(self, include_parents: bool, profile: Option<&PerformanceProfile>) -> Job {
        let files = if include_parents {
            self.files
        } else {
            self.files.iter().map(CatalogFile::without_parents).collect()
        };

        let estimate = profile
            .map(|profile| perf::estimate(profile, self.assigned_events))
            .unwrap_or_default();

        let job = Job::new(files, Mask::from_segments(self.segments), estimate);

        match self.flagged {
            Some(reason) => job.fail_on_creation(reason),
            None => job,
        }
    }
}

/// walk files, runs and lumis in order and cut the stream into chunks
///
/// A chunk closes when the sizing budget would be exceeded by the next lumi,
/// when `split_on_run` is set and the next lumi belongs to a different run,
/// or when `halt_on_file_boundary` is set and it belongs to a different
/// file, in that priority. The last chunk closes unconditionally at the end
/// of input; an empty chunk is never emitted.
pub(crate) fn walk<B>(files: &[EligibleFile], boundaries: Boundaries, mut budget: B) -> Vec<Chunk>
where
    B: FnMut(&CatalogFile) -> FileBudget,
{
    let mut chunks = Vec::new();
    let mut chunk = Chunk::default();

    for eligible in files {
        let file_budget = budget(&eligible.file);

        for (run, ranges) in eligible.runs.iter() {
            for range in ranges {
                let mut next = range.first();

                loop {
                    if !chunk.is_empty() {
                        if chunk.lumi_count >= file_budget.lumis
                            || (boundaries.split_on_run && chunk.current_run != Some(*run))
                            || (boundaries.halt_on_file_boundary
                                && chunk.current_lfn.as_deref()
                                    != Some(eligible.file.lfn.as_str()))
                        {
                            trace!(
                                lumis = chunk.lumi_count,
                                runs = chunk.segments.len(),
                                "Closed chunk"
                            );
                            chunks.push(mem::take(&mut chunk));
                        }
                    }

                    // after a close the chunk is empty, so at least one lumi fits
                    let capacity = file_budget.lumis - chunk.lumi_count;
                    let remaining = u64::from(range.last() - next) + 1;
                    let take = capacity.min(remaining);
                    let last = next + (take - 1) as Lumi;

                    chunk.push(&eligible.file, *run, LumiRange::ordered(next, last), &file_budget);

                    if last == range.last() {
                        break;
                    }
                    next = last + 1;
                }
            }
        }
    }

    if !chunk.is_empty() {
        chunks.push(chunk);
    }

    chunks
}
