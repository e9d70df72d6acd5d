//! Job executor: routes maintenance jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use tourhub_core::AppError;

/// A maintenance job implementation.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The job type this handler processes.
    fn job_type(&self) -> &str;

    /// Run the job once and report what it did.
    async fn execute(&self) -> Result<Value, JobExecutionError>;
}

/// Error from job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, running again will not help.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, the next scheduled run may succeed.
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Error raised by a service.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches jobs to the handler registered for their type.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same type.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    /// Run the job of type `job_type`.
    pub async fn execute(&self, job_type: &str) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{job_type}'"
            ))
        })?;
        info!(job_type, "Executing job");
        handler.execute().await
    }

    /// Whether a handler is registered for `job_type`.
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}
