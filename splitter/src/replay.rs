#[cfg(feature = "rusqlite")]
pub mod sqlite;

use crate::{
    config::{ReplayConfig, ReplayStoreConfig},
    mask::{LumiRange, Mask, RunNumber},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Replay store not found")]
    StoreNotFound(PathBuf),
    #[error("Failed to read replay store")]
    ReadStore(#[from] std::io::Error),
    #[error("Failed to deserialize replay records")]
    DeserializeRecords(#[from] serde_yaml::Error),
    #[cfg(feature = "rusqlite")]
    #[error("Replay store query failed")]
    SQLite(#[from] rusqlite::Error),
}

/// the run/lumi ranges one failed job attempt did not complete
/// written by the execution layer, read-only for this engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailureRecord {
    pub run: RunNumber,
    pub ranges: Vec<LumiRange>,
}

/// records grouped by the reference they were recorded under
pub type RecordMap = BTreeMap<String, Vec<FailureRecord>>;

/// All supported replay store clients, initialized from `ReplayStores::load`
#[derive(Debug)]
pub enum ReplayStores {
    /// failure records serialized by the execution layer
    Yaml { path: PathBuf },
    /// in-memory records, for tests and embedding callers
    Memory(RecordMap),
    #[cfg(feature = "rusqlite")]
    SQLite(sqlite::SQLiteReplayStore),
}

impl ReplayStores {
    pub fn load(config: &ReplayConfig) -> Result<Self, ReplayError> {
        match &config.store {
            ReplayStoreConfig::Yaml { path } => {
                if !path.is_file() {
                    return Err(ReplayError::StoreNotFound(path.clone()));
                }

                debug!(path = ?path, "Using YAML replay store");

                Ok(Self::Yaml { path: path.clone() })
            }
            #[cfg(feature = "rusqlite")]
            ReplayStoreConfig::SQLite { path } => {
                Ok(Self::SQLite(sqlite::SQLiteReplayStore::open(path)?))
            }
        }
    }

    /// per-run union of all ranges recorded against failed jobs under `reference`
    ///
    /// A reference with no recorded failures yields an empty mask, which in
    /// turn yields an empty partition. An unreachable store is an error: the
    /// caller must not fall back to splitting everything.
    pub fn failed_units(&self, reference: &str) -> Result<Mask, ReplayError> {
        let mask = match self {
            Self::Yaml { path } => {
                let records: RecordMap = serde_yaml::from_str(&fs::read_to_string(path)?)?;

                merge_records(records.get(reference).map(Vec::as_slice).unwrap_or(&[]))
            }
            Self::Memory(records) => {
                merge_records(records.get(reference).map(Vec::as_slice).unwrap_or(&[]))
            }
            #[cfg(feature = "rusqlite")]
            Self::SQLite(store) => store.failed_units(reference)?,
        };

        info!(
            reference = %reference,
            runs = mask.run_numbers().count(),
            lumis = mask.lumi_count(),
            "Resolved previously failed units"
        );

        Ok(mask)
    }
}

fn merge_records(records: &[FailureRecord]) -> Mask {
    let mut mask = Mask::default();

    for record in records {
        mask.add_ranges(record.run, record.ranges.iter().copied());
    }

    mask
}

#[cfg(test)]
mod replay_test;
