//! AWS-oriented adapters and handlers for seed sweep dispatch.
//!
//! This crate owns runtime integration details (Lambda handlers, queue
//! publishing and summary storage adapters) on top of the partitioning and
//! contract primitives in `seed_sweep_core`.

pub mod adapters;
pub mod handlers;
pub mod logging;
pub mod publisher;
