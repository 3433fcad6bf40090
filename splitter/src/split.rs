pub(crate) mod chunk;
pub mod event_aware;
pub mod lumi_based;

use crate::{
    catalog::{CatalogError, Catalogs, Subscription},
    config::{PolicyConfig, SplitConfig, ALGORITHM_EVENT_AWARE, ALGORITHM_LUMI_BASED},
    job::Partition,
    mask::Mask,
    replay::{ReplayError, ReplayStores},
};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Split algorithm not supported")]
    UnsupportedAlgorithm(String),
    #[error("Policy option {0} must be set to a positive number")]
    MissingBudget(&'static str),
    #[error("Failed to take the catalog snapshot")]
    Catalog(#[from] CatalogError),
    #[error("Failed to query the replay store")]
    Replay(#[from] ReplayError),
    #[error("Replay restriction configured but no replay store client was provided")]
    MissingReplayStore,
}

/// All supported splitter kinds
/// These should be initialized from `Splitters::load`
/// (this is deliberately not made with dynamic dispatch to avoid the headache)
#[derive(Debug, Clone)]
pub enum Splitters {
    LumiBased(lumi_based::LumiBasedSplitter),
    EventAware(event_aware::EventAwareSplitter),
}

impl Splitters {
    pub fn load(policy: &PolicyConfig) -> Result<Self, SplitError> {
        match policy.algorithm.as_str() {
            ALGORITHM_LUMI_BASED => Ok(Self::LumiBased(lumi_based::LumiBasedSplitter::load(
                policy,
            )?)),
            ALGORITHM_EVENT_AWARE => Ok(Self::EventAware(event_aware::EventAwareSplitter::load(
                policy,
            )?)),
            _ => Err(SplitError::UnsupportedAlgorithm(policy.algorithm.clone())),
        }
    }

    /// compute the partition for one subscription snapshot
    ///
    /// Pure and deterministic: the same subscription, policy and replay mask
    /// always yield the same partition, so a caller may safely recompute.
    #[instrument(skip_all, level = "info")]
    pub fn split(&self, subscription: &Subscription, replay: Option<&Mask>) -> Partition {
        match self {
            Self::LumiBased(splitter) => splitter.split(subscription, replay),
            Self::EventAware(splitter) => splitter.split(subscription, replay),
        }
    }
}

/// take one consistent snapshot from the upstream clients and split it
///
/// Both reads happen before any partitioning starts; mixing information
/// observed at different times could let computed masks disagree with what
/// is persisted later.
#[instrument(skip_all, level = "info")]
pub fn split_once(
    catalog: &Catalogs,
    replay: Option<&ReplayStores>,
    config: &SplitConfig,
) -> Result<Partition, SplitError> {
    let splitter = Splitters::load(&config.split)?;
    let subscription = catalog.subscription()?;

    let replay_mask = match (replay, config.replay.as_ref()) {
        (Some(store), Some(replay_config)) => Some(store.failed_units(&replay_config.reference)?),
        // splitting everything instead would duplicate work that already succeeded
        (None, Some(_)) => return Err(SplitError::MissingReplayStore),
        _ => None,
    };

    let partition = splitter.split(&subscription, replay_mask.as_ref());

    info!(
        workflow = %partition.workflow,
        jobs = partition.jobs.len(),
        failed = partition.failed_jobs(),
        lumis = partition.coverage().lumi_count(),
        "Computed partition"
    );

    Ok(partition)
}
