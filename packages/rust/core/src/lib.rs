//! Orchestration for billtrack: the two-phase scrape pipeline and the
//! service that pairs it with best-effort snapshot persistence.

pub mod pipeline;
pub mod service;

pub use pipeline::{Pipeline, PipelineReport, ProgressReporter, SilentProgress};
pub use service::BillService;
