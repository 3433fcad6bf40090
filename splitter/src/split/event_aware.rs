use super::{
    chunk::{self, Boundaries, FileBudget},
    SplitError,
};
use crate::{
    catalog::Subscription,
    config::PolicyConfig,
    eligible::{self, EligibleFile},
    job::Partition,
    mask::{Mask, RunNumber},
    perf::{self, PerformanceProfile},
};
use std::collections::BTreeSet;
use tracing::debug;

/// splitter targeting an estimated event count per job
///
/// The lumi budget is recomputed per file from its event rate; jobs whose
/// single lumi overruns `max_events_per_lumi` are still produced, marked as
/// failed on creation.
#[derive(Debug, Clone)]
pub struct EventAwareSplitter {
    events_per_job: u64,
    max_events_per_lumi: Option<u64>,
    performance: PerformanceProfile,
    boundaries: Boundaries,
    include_parents: bool,
    run_whitelist: Option<BTreeSet<RunNumber>>,
}

impl EventAwareSplitter {
    pub fn load(policy: &PolicyConfig) -> Result<Self, SplitError> {
        let events_per_job = policy
            .events_per_job
            .filter(|budget| *budget > 0)
            .ok_or(SplitError::MissingBudget("events_per_job"))?;

        Ok(Self {
            events_per_job,
            max_events_per_lumi: policy.max_events_per_lumi,
            performance: policy.performance,
            boundaries: Boundaries {
                halt_on_file_boundary: policy.halt_on_file_boundary,
                split_on_run: policy.split_on_run,
            },
            include_parents: policy.include_parents,
            run_whitelist: policy.run_whitelist.clone(),
        })
    }

    pub fn split(&self, subscription: &Subscription, replay: Option<&Mask>) -> Partition {
        let eligible =
            eligible::resolve(&subscription.files, self.run_whitelist.as_ref(), replay);

        self.split_eligible(subscription, &eligible)
    }

    fn split_eligible(&self, subscription: &Subscription, eligible: &[EligibleFile]) -> Partition {
        let chunks = chunk::walk(eligible, self.boundaries, |file| {
            let events_per_lumi = perf::events_per_lumi(file);

            if let Some(reason) = self
                .max_events_per_lumi
                .and_then(|max| perf::over_limit_reason(file, events_per_lumi, max))
            {
                debug!(lfn = %file.lfn, "File overruns the per-lumi event cap");

                // one lumi being the smallest unit, isolate each and surface the overflow
                return FileBudget {
                    lumis: 1,
                    events_per_lumi,
                    flagged: Some(reason),
                };
            }

            FileBudget {
                lumis: perf::lumi_budget(self.events_per_job, events_per_lumi),
                events_per_lumi,
                flagged: None,
            }
        });

        Partition::assemble(
            subscription,
            chunks
                .into_iter()
                .map(|chunk| chunk.into_job(self.include_parents, Some(&self.performance)))
                .collect(),
        )
    }
}
