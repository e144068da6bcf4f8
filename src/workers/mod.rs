//! Background workers

pub mod enhancement;

pub use enhancement::{EnhancementWorker, PipelineOutcome, WorkerHandle, WorkerSettings};
