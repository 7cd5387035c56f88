//! Cycle orchestration for the countdown courier.
//!
//! This crate provides:
//! - `DailyCycle`, which turns one clock reading into a delivered mail,
//!   a no-op past the target, or an operator alert
//! - `RetryPolicy` with bounded, capped exponential backoff
//! - cron helpers for the daemon's daily fire time

pub mod cron;
pub mod cycle;
pub mod policy;

pub use cycle::{CycleOutcome, DailyCycle};
pub use policy::RetryPolicy;
