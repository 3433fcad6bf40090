use crate::{mask::RunNumber, perf::PerformanceProfile};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Config file not found")]
    FileNotFound,
    #[error("Failed to read config file")]
    ReadConfig(#[from] std::io::Error),
    #[error("Failed to deserialize config file")]
    DeserializeConfig(#[from] serde_yaml::Error),
}

/// splitter algorithm names accepted in `split.algorithm`
/// see `Splitters::load` for the selection proccess
pub const ALGORITHM_LUMI_BASED: &str = "lumi_based";
pub const ALGORITHM_EVENT_AWARE: &str = "event_aware";

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SplitConfig {
    // file catalog client the snapshot is taken from
    pub catalog: CatalogConfig,
    // optional replay store restricting the split to previously failed units
    #[serde(default)]
    pub replay: Option<ReplayConfig>,

    #[serde(alias = "policy")]
    pub split: PolicyConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub enum CatalogConfig {
    Yaml { path: PathBuf },
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    pub store: ReplayStoreConfig,
    // reference the failed units were recorded under, usually the workflow name
    pub reference: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub enum ReplayStoreConfig {
    Yaml {
        path: PathBuf,
    },
    #[cfg(feature = "rusqlite")]
    SQLite {
        path: PathBuf,
    },
}

/// the recognized configuration for one split invocation
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    // name of the selected splitter, see Splitters::load for the selection proccess
    pub algorithm: String,

    // fixed chunk budget in lumis (lumi based mode)
    #[serde(default, alias = "lumisPerJob")]
    pub lumis_per_job: Option<u64>,
    // target chunk budget in estimated events (event aware mode)
    #[serde(default, alias = "eventsPerJob")]
    pub events_per_job: Option<u64>,

    // a chunk never spans two files
    #[serde(default, alias = "haltOnFileBoundary")]
    pub halt_on_file_boundary: bool,
    // a chunk never spans two runs
    #[serde(default = "default_split_on_run", alias = "splitOnRun")]
    pub split_on_run: bool,

    // restrict the eligible space to these runs
    #[serde(default, alias = "runWhitelist")]
    pub run_whitelist: Option<BTreeSet<RunNumber>>,
    // hard cap on events carried by a single unsplittable lumi (event aware mode)
    #[serde(default, alias = "maxEventsPerLumi")]
    pub max_events_per_lumi: Option<u64>,
    // attach resolved parent files to the job payload
    #[serde(default, alias = "includeParents")]
    pub include_parents: bool,

    // resource estimate inputs (event aware mode)
    #[serde(default)]
    pub performance: PerformanceProfile,
}

impl SplitConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        if !path.is_file() {
            return Err(ConfigErrors::FileNotFound);
        }

        Ok(serde_yaml::from_str(&fs::read_to_string(path)?)?)
    }

    /// check the whole config in one pass and log every problem found
    /// returns true if any check failed
    pub fn preflight_checks(&mut self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        self.split.algorithm = self.split.algorithm.to_lowercase();

        match self.split.algorithm.as_str() {
            ALGORITHM_LUMI_BASED => {
                match self.split.lumis_per_job {
                    None => {
                        error!("split.lumis_per_job must be set for the lumi based splitter");
                        contains_error = true;
                    }
                    Some(0) => {
                        error!("split.lumis_per_job cannot be 0, no chunk could ever close");
                        contains_error = true;
                    }
                    Some(_) => {}
                }

                if self.split.events_per_job.is_some() {
                    warn!("split.events_per_job is ignored by the lumi based splitter");
                }
                if self.split.max_events_per_lumi.is_some() {
                    warn!("split.max_events_per_lumi is ignored by the lumi based splitter");
                }
            }
            ALGORITHM_EVENT_AWARE => {
                match self.split.events_per_job {
                    None => {
                        error!("split.events_per_job must be set for the event aware splitter");
                        contains_error = true;
                    }
                    Some(0) => {
                        error!("split.events_per_job cannot be 0");
                        contains_error = true;
                    }
                    Some(_) => {}
                }

                if self.split.lumis_per_job.is_some() {
                    warn!("split.lumis_per_job is ignored by the event aware splitter");
                }
                if self.split.max_events_per_lumi == Some(0) {
                    error!("split.max_events_per_lumi cannot be 0, every lumi would overflow it");
                    contains_error = true;
                }
            }
            algorithm => {
                error!("split.algorithm ({algorithm}) is not supported, please use `{ALGORITHM_LUMI_BASED}` or `{ALGORITHM_EVENT_AWARE}`");
                contains_error = true;
            }
        }

        if let Some(whitelist) = &self.split.run_whitelist {
            if whitelist.is_empty() {
                warn!("split.run_whitelist is empty, the computed partition will be empty");
            }
        }

        if let Some(replay) = &self.replay {
            if replay.reference.is_empty() {
                error!("replay.reference cannot be empty, failed units could not be looked up");
                contains_error = true;
            }
        }

        contains_error
    }
}

fn default_split_on_run() -> bool {
    true
}

#[cfg(test)]
mod config_test;
