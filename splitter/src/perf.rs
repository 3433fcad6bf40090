use crate::catalog::CatalogFile;
use serde::{Deserialize, Serialize};

/// resource estimate inputs from the workflow performance profile
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PerformanceProfile {
    #[serde(default, alias = "timePerEvent")]
    pub time_per_event: f64,
    #[serde(default, alias = "sizePerEvent")]
    pub size_per_event: f64,
    // fixed per-job figure, not scaled by event count
    #[serde(default, alias = "memoryRequirement")]
    pub memory_requirement: f64,
}

/// estimated resource usage of one produced job
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceEstimate {
    pub job_time: f64,
    pub disk_usage: f64,
    pub memory_usage: f64,
}

/// average number of events per lumi section of one file
/// a file with zero events or zero coverage yields 0.0, meaning "no constraint"
pub fn events_per_lumi(file: &CatalogFile) -> f64 {
    let lumis = file.lumi_count();

    if lumis == 0 || file.events == 0 {
        0.0
    } else {
        file.events as f64 / lumis as f64
    }
}

/// effective lumi budget for a file under a target event count per job
/// unconstrained when the event rate carries no information
pub fn lumi_budget(events_per_job: u64, events_per_lumi: f64) -> u64 {
    if events_per_lumi <= 0.0 {
        u64::MAX
    } else {
        ((events_per_job as f64 / events_per_lumi).floor() as u64).max(1)
    }
}

/// convert the events assigned to a job into time/disk/memory figures
pub fn estimate(profile: &PerformanceProfile, assigned_events: f64) -> ResourceEstimate {
    ResourceEstimate {
        job_time: assigned_events * profile.time_per_event,
        disk_usage: assigned_events * profile.size_per_event,
        memory_usage: profile.memory_requirement,
    }
}

/// check a file against the hard per-lumi event cap
/// the returned reason marks the affected jobs as failed on creation
pub fn over_limit_reason(
    file: &CatalogFile,
    events_per_lumi: f64,
    max_events_per_lumi: u64,
) -> Option<String> {
    if events_per_lumi > max_events_per_lumi as f64 {
        Some(format!(
            "File {} has too many events ({}) in {} lumi(s)",
            file.lfn,
            file.events,
            file.lumi_count()
        ))
    } else {
        None
    }
}
