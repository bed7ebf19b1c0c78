//! Shared seed sweep domain primitives.
//!
//! This crate owns the deterministic partitioning of a PRNG seed space into
//! queue-sized blocks, the job/block contracts, and token generation for queue
//! entries. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod batching;
pub mod config;
pub mod contract;
pub mod error;
pub mod partition;
pub mod seed_space;
pub mod storage_keys;
pub mod tokens;
