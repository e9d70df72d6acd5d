//! # tourhub-entity
//!
//! Domain entity models for TourHub. Every struct in this crate
//! represents a database table row or a domain value object. Status,
//! priority, and channel concepts are closed enums so that no call site
//! deals in string literals.

pub mod notification;
pub mod order;
pub mod user;
