//! Asynchronous jobs: registry, runner and expiry sweep.
//!
//! A job moves `Processing -> Completed | Failed` exactly once. The
//! [`JobRegistry`] is the only shared mutable state; each job has a single
//! runner task, and a runner whose job has been swept or fetched in the
//! meantime has its final write discarded and deletes what it produced.

mod config;
mod error;
mod registry;
mod service;
mod types;

pub use config::JobsConfig;
pub use error::JobError;
pub use registry::{ArtifactGuard, JobRegistry};
pub use service::JobService;
pub use types::{Job, JobId, JobRequest, JobState, JobStatus, JobView};
