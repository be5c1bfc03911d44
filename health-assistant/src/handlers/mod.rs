//! HTTP handlers for the health assistant service.

pub mod chat;
pub mod health;
pub mod metrics;
