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
};
use std::collections::BTreeSet;

/// splitter with a fixed lumi count per job
///
/// The budget counts lumis across all runs and files a chunk spans, subject
/// to the configured boundary rules.
#[derive(Debug, Clone)]
pub struct LumiBasedSplitter {
    lumis_per_job: u64,
    boundaries: Boundaries,
    include_parents: bool,
    run_whitelist: Option<BTreeSet<RunNumber>>,
}

impl LumiBasedSplitter {
    pub fn load(policy: &PolicyConfig) -> Result<Self, SplitError> {
        let lumis_per_job = policy
            .lumis_per_job
            .filter(|budget| *budget > 0)
            .ok_or(SplitError::MissingBudget("lumis_per_job"))?;

        Ok(Self {
            lumis_per_job,
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
        let chunks = chunk::walk(eligible, self.boundaries, |_file| FileBudget {
            lumis: self.lumis_per_job,
            events_per_lumi: 0.0,
            flagged: None,
        });

        Partition::assemble(
            subscription,
            chunks
                .into_iter()
                .map(|chunk| chunk.into_job(self.include_parents, None))
                .collect(),
        )
    }
}
