//! Order priority scoring.

pub mod classifier;

pub use classifier::{OrderSnapshot, PriorityClassifier};
