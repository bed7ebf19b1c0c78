use seed_sweep_core::batching::{batched, send_limit};
use seed_sweep_core::contract::Block;
use seed_sweep_core::error::DispatchError;
use seed_sweep_core::tokens::TokenSource;
use serde_json::json;

use crate::adapters::queue::{QueueEntry, QueueGateway, QueueHandle};
use crate::logging::{log_error, log_warn};

const COMPONENT: &str = "batch_publisher";

/// Running totals of one job's publish calls.
///
/// `blocks` and `batches` count every attempted publish, including failed
/// ones, so they always equal the partition's block count and batch count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishTally {
    pub blocks: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub dropped_blocks: usize,
}

/// Groups blocks into batches of up to ten and publishes them one at a time.
///
/// A failed batch is logged and dropped; later batches are still published.
pub struct BatchPublisher<'a> {
    gateway: &'a dyn QueueGateway,
    tokens: &'a dyn TokenSource,
}

impl<'a> BatchPublisher<'a> {
    pub fn new(gateway: &'a dyn QueueGateway, tokens: &'a dyn TokenSource) -> Self {
        Self { gateway, tokens }
    }

    pub fn publish_all<'b>(
        &self,
        job_id: &str,
        queue: &QueueHandle,
        blocks: impl Iterator<Item = Block<'b>>,
    ) -> PublishTally {
        let mut tally = PublishTally::default();

        for (batch_index, batch) in batched(blocks, send_limit()).enumerate() {
            tally.blocks += batch.len();
            tally.batches += 1;

            match self.publish_one(queue, batch_index, &batch) {
                Ok(rejected) => tally.dropped_blocks += rejected,
                Err(error) => {
                    tally.failed_batches += 1;
                    tally.dropped_blocks += batch.len();
                    log_error(
                        COMPONENT,
                        error.error_code(),
                        job_id,
                        json!({
                            "batch_index": batch_index,
                            "min_seed": batch[0].min_seed,
                            "max_seed": batch[batch.len() - 1].max_seed,
                            "blocks": batch.len(),
                            "error": error.to_string(),
                        }),
                    );
                }
            }
        }

        tally
    }

    /// Returns how many entries the transport rejected inside an accepted call.
    fn publish_one(
        &self,
        queue: &QueueHandle,
        batch_index: usize,
        batch: &[Block<'_>],
    ) -> Result<usize, DispatchError> {
        let entries = batch
            .iter()
            .map(|block| self.encode(block))
            .collect::<Result<Vec<_>, _>>()?;

        let receipt = self
            .gateway
            .publish_batch(queue, &entries)
            .map_err(|message| DispatchError::BatchPublish {
                batch_index,
                message,
            })?;

        if !receipt.failed.is_empty() {
            let job_id = batch[0].job.job_id.as_str();
            log_warn(
                COMPONENT,
                "batch_partially_failed",
                job_id,
                json!({
                    "batch_index": batch_index,
                    "accepted": receipt.accepted,
                    "failed": receipt
                        .failed
                        .iter()
                        .map(|entry| json!({"entry_id": entry.entry_id, "message": entry.message}))
                        .collect::<Vec<_>>(),
                }),
            );
        }

        Ok(receipt.failed.len())
    }

    fn encode(&self, block: &Block<'_>) -> Result<QueueEntry, DispatchError> {
        let body = serde_json::to_string(block)
            .map_err(|error| DispatchError::Serialization(error.to_string()))?;
        let tokens = self
            .tokens
            .tokens_for(&block.job.job_id, block.min_seed, block.max_seed);

        Ok(QueueEntry {
            entry_id: tokens.entry_id,
            body,
            group_token: tokens.group_token,
            dedup_token: tokens.dedup_token,
        })
    }
}
