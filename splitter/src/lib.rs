//! Job-splitting engine: converts a registered set of input files, each
//! covering known runs and lumi sections, into a deterministic partition of
//! jobs with exact run/lumi masks.

pub mod catalog;
pub mod config;
pub mod eligible;
pub mod job;
pub mod mask;
pub mod perf;
pub mod replay;
pub mod split;
