use crate::{
    catalog::{CatalogFile, Subscription},
    mask::Mask,
    perf::ResourceEstimate,
};
use serde::Serialize;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// terminal state a job leaves this engine in
/// whatever happens afterwards belongs to the execution layer
#[derive(Serialize_repr, Deserialize_repr, PartialEq, Eq, Debug, Clone, Copy)]
#[repr(i8)]
pub enum JobState {
    FailedOnCreation = -1,
    Computed = 1,
}

/// the unit of output: the files a job draws from, its mask and the
/// estimated resource usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub files: Vec<CatalogFile>,
    pub mask: Mask,
    pub estimated_job_time: f64,
    pub estimated_disk_usage: f64,
    pub estimated_memory_usage: f64,
    pub state: JobState,
    pub failed_reason: Option<String>,
}

impl Job {
    pub fn new(files: Vec<CatalogFile>, mask: Mask, estimate: ResourceEstimate) -> Self {
        Self {
            files,
            mask,
            estimated_job_time: estimate.job_time,
            estimated_disk_usage: estimate.disk_usage,
            estimated_memory_usage: estimate.memory_usage,
            state: JobState::Computed,
            failed_reason: None,
        }
    }

    /// mark a job that is certain to overrun its resource allocation
    /// it stays a first-class member of the partition
    pub fn fail_on_creation(mut self, reason: String) -> Self {
        self.state = JobState::FailedOnCreation;
        self.failed_reason = Some(reason);

        self
    }

    pub fn failed_on_creation(&self) -> bool {
        self.state == JobState::FailedOnCreation
    }
}

/// ordered list of jobs produced by one split invocation,
/// tied to the originating subscription
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub workflow: String,
    pub fileset: String,
    pub jobs: Vec<Job>,
}

impl Partition {
    /// package jobs in emission order into one partition
    pub fn assemble(subscription: &Subscription, jobs: Vec<Job>) -> Self {
        Self {
            workflow: subscription.workflow.clone(),
            fileset: subscription.name.clone(),
            jobs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn failed_jobs(&self) -> usize {
        self.jobs.iter().filter(|job| job.failed_on_creation()).count()
    }

    /// union of all job masks, i.e. the run/lumi space this partition covers
    pub fn coverage(&self) -> Mask {
        let mut coverage = Mask::default();

        for job in self.jobs.iter() {
            coverage.union(&job.mask);
        }

        coverage
    }
}
