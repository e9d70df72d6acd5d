//! Background processing for TourHub.
//!
//! This crate provides:
//! - A bounded in-process dispatch queue that accepts notification work
//!   from the order path
//! - A worker runner that drains the queue with bounded concurrency
//! - A job executor that dispatches maintenance jobs to their handlers
//! - A cron scheduler that runs those jobs periodically

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use queue::{DispatchQueue, DispatchReceiver};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
