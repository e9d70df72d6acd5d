//! # tourhub-database
//!
//! Persistence for TourHub. The [`store`] module defines the traits the
//! booking core depends on; [`repositories`] implements them on
//! PostgreSQL and [`memory`] implements them in-process for tests and
//! single-node development.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod stores;

pub use connection::DatabasePool;
pub use stores::{MemoryStores, Stores};
