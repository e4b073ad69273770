//! Reference driver.
//!
//! The engine core owns no executor. This module provides one: a tokio-based
//! runner that fires ready transitions concurrently with semaphore
//! backpressure.

pub mod concurrency_control;
pub mod config;
pub mod runner;

pub use concurrency_control::{ConcurrencyControl, ConcurrencyPermit};
pub use config::RunnerConfig;
pub use runner::{NetRunner, RunReport, RunStats};
