//! # tourhub-service
//!
//! Business logic for the booking-priority and notification pipeline.
//!
//! Services follow constructor injection: every collaborator is handed
//! in at construction time behind an `Arc`, so the same services run on
//! PostgreSQL, on the in-memory stores, or against scripted senders in
//! tests.

pub mod context;
pub mod notification;
pub mod order;
pub mod priority;

pub use context::AuthContext;
pub use notification::{
    ChannelDelivery, ChannelSender, DispatchRequest, NotificationDispatcher, NotificationLogger,
    NotificationPipeline,
    RetryCoordinator, RetryOutcome, SendError, SendReceipt, SenderRegistry, TemplateRegistry,
    TemplateRenderer,
};
pub use order::{
    DispatchHandle, DispatchScheduler, DispatchTask, InlineScheduler, OrderCreated, OrderService,
    RescoreResult, RescoreScope, SpawnScheduler,
};
pub use priority::{OrderSnapshot, PriorityClassifier};
