use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::seed_space::SeedSpaceModel;

/// Body of a job submission before a job identifier is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartRequest {
    #[serde(default)]
    pub observations: Vec<i64>,
    pub prng: String,
    #[serde(default)]
    pub depth: u64,
}

/// One logical seed-recovery job. Read-only once dispatch begins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub observations: Vec<i64>,
    pub prng: String,
    pub depth: u64,
}

/// A contiguous `[min_seed, max_seed)` slice of a job's seed space.
///
/// Borrows the job so a lazily produced block sequence never copies the
/// observation list until the block is encoded into a queue message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Block<'a> {
    #[serde(flatten)]
    pub job: &'a Job,
    pub min_seed: u64,
    pub max_seed: u64,
}

/// Owned queue message body as consumed by seed-verification workers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockMessage {
    pub job_id: String,
    pub observations: Vec<i64>,
    pub prng: String,
    pub depth: u64,
    pub min_seed: u64,
    pub max_seed: u64,
}

/// Block and batch tally persisted once per dispatched job.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub blocks: usize,
    pub batches: usize,
}

pub fn normalize_start_request(
    payload: StartRequest,
    seed_space: &SeedSpaceModel,
) -> Result<StartRequest, ValidationError> {
    let prng = payload.prng.trim().to_string();
    if prng.is_empty() {
        return Err(ValidationError::new("prng cannot be empty"));
    }

    if !seed_space.is_supported(&prng) {
        return Err(ValidationError::new("unsupported prng"));
    }

    if payload.observations.is_empty() {
        return Err(ValidationError::new("observations cannot be empty"));
    }

    Ok(StartRequest {
        observations: payload.observations,
        prng,
        depth: payload.depth,
    })
}

impl StartRequest {
    pub fn into_job(self, job_id: impl Into<String>) -> Job {
        Job {
            job_id: job_id.into(),
            observations: self.observations,
            prng: self.prng,
            depth: self.depth,
        }
    }
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}
