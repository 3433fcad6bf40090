use crate::{
    config::CatalogConfig,
    mask::{Lumi, RunNumber},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::PathBuf,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog snapshot not found")]
    SnapshotNotFound(PathBuf),
    #[error("Failed to read catalog snapshot")]
    ReadSnapshot(#[from] std::io::Error),
    #[error("Failed to deserialize catalog snapshot")]
    DeserializeSnapshot(#[from] serde_yaml::Error),
}

/// one run covered by a file: the run number plus the lumi sections
/// this particular file contains for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRun {
    #[serde(alias = "runNumber")]
    pub run_number: RunNumber,
    pub lumis: BTreeSet<Lumi>,
}

/// immutable snapshot of one registered input file
///
/// Files are created by the upstream catalog before a split begins and are
/// never mutated here; parent resolution happens upstream and arrives as
/// part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub lfn: String,
    #[serde(default)]
    pub events: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(default)]
    pub parents: Vec<CatalogFile>,
    #[serde(default)]
    pub runs: Vec<FileRun>,
}

impl CatalogFile {
    /// total number of lumi sections this file covers, over all runs
    pub fn lumi_count(&self) -> u64 {
        self.runs.iter().map(|run| run.lumis.len() as u64).sum()
    }

    /// coverage as a run keyed map, merging duplicate run entries
    pub fn run_lumis(&self) -> BTreeMap<RunNumber, BTreeSet<Lumi>> {
        let mut runs: BTreeMap<RunNumber, BTreeSet<Lumi>> = BTreeMap::new();

        for run in self.runs.iter() {
            runs.entry(run.run_number)
                .or_default()
                .extend(run.lumis.iter().copied());
        }

        runs
    }

    /// copy of this descriptor with the parent files stripped
    pub fn without_parents(&self) -> Self {
        Self {
            parents: Vec::new(),
            ..self.clone()
        }
    }
}

/// a named group of files bound to an owning workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subscription {
    pub workflow: String,
    #[serde(alias = "fileset")]
    pub name: String,
    #[serde(default)]
    pub files: Vec<CatalogFile>,
}

/// All supported file catalog clients, initialized from `Catalogs::load`
#[derive(Debug, Clone)]
pub enum Catalogs {
    /// consistent snapshot serialized by the upstream catalog
    Yaml { path: PathBuf },
    /// in-memory subscription, for tests and embedding callers
    Memory(Subscription),
}

impl Catalogs {
    pub fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        match config {
            CatalogConfig::Yaml { path } => {
                if !path.is_file() {
                    return Err(CatalogError::SnapshotNotFound(path.clone()));
                }

                debug!(path = ?path, "Using YAML catalog snapshot");

                Ok(Self::Yaml { path: path.clone() })
            }
        }
    }

    /// read the subscription in one consistent snapshot
    pub fn subscription(&self) -> Result<Subscription, CatalogError> {
        match self {
            Self::Yaml { path } => {
                let raw = fs::read_to_string(path)?;
                let subscription: Subscription = serde_yaml::from_str(&raw)?;

                info!(
                    workflow = %subscription.workflow,
                    files = subscription.files.len(),
                    "Loaded catalog snapshot"
                );

                Ok(subscription)
            }
            Self::Memory(subscription) => Ok(subscription.clone()),
        }
    }
}

#[cfg(test)]
mod catalog_test;
