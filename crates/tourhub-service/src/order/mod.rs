//! Order use cases: creation, classification, rescoring, overrides.

pub mod scheduler;
pub mod service;

pub use scheduler::{
    DispatchHandle, DispatchOutcome, DispatchScheduler, DispatchTask, InlineScheduler,
    SpawnScheduler,
};
pub use service::{OrderCreated, OrderService, RescoreResult, RescoreScope};
