use std::time::Instant;

use seed_sweep_core::config::DispatchConfig;
use seed_sweep_core::contract::{stable_contract_json, DispatchSummary, Job};
use seed_sweep_core::error::DispatchError;
use seed_sweep_core::partition::{block_count, partition};
use seed_sweep_core::seed_space::SeedSpaceModel;
use seed_sweep_core::storage_keys::{object_key, queue_name, summary_location};
use seed_sweep_core::tokens::TokenSource;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::queue::{QueueAttributes, QueueGateway, QueueHandle};
use crate::adapters::summary_store::SummaryStore;
use crate::logging::{log_error, log_info};
use crate::publisher::BatchPublisher;

const COMPONENT: &str = "dispatch_coordinator";

/// Lifecycle of one job's dispatch, in the order the stages are reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStage {
    Created,
    QueueReady,
    Partitioning,
    Dispatched,
    Summarized,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub job_id: String,
    pub queue_name: String,
    pub stage: DispatchStage,
    pub summary: DispatchSummary,
    pub failed_batches: usize,
    pub dropped_blocks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
}

/// Drives one job from queue creation to the persisted block summary.
pub struct DispatchCoordinator<'a> {
    seed_space: &'a SeedSpaceModel,
    config: &'a DispatchConfig,
    gateway: &'a dyn QueueGateway,
    summary_store: &'a dyn SummaryStore,
    tokens: &'a dyn TokenSource,
}

impl<'a> DispatchCoordinator<'a> {
    pub fn new(
        seed_space: &'a SeedSpaceModel,
        config: &'a DispatchConfig,
        gateway: &'a dyn QueueGateway,
        summary_store: &'a dyn SummaryStore,
        tokens: &'a dyn TokenSource,
    ) -> Self {
        Self {
            seed_space,
            config,
            gateway,
            summary_store,
            tokens,
        }
    }

    /// Runs the dispatch to completion.
    ///
    /// Returns an error only for the fatal exits: an unsupported PRNG (before
    /// any queue call) and a failed queue creation (before any publish).
    /// Batch and summary failures are logged and reflected in the report.
    pub fn run(&self, job: &Job) -> Result<DispatchReport, DispatchError> {
        let started_at = Instant::now();
        log_info(
            COMPONENT,
            "dispatch_started",
            &job.job_id,
            json!({
                "prng": job.prng.clone(),
                "depth": job.depth,
                "observations": job.observations.len(),
                "block_size": self.config.block_size.get(),
            }),
        );

        let bound = match self.seed_space.bound_for(&job.prng) {
            Ok(bound) => bound,
            Err(error) => {
                log_error(
                    COMPONENT,
                    "unsupported_prng",
                    &job.job_id,
                    json!({ "prng": job.prng.clone(), "stage": DispatchStage::Created }),
                );
                return Err(error);
            }
        };

        let queue = self.create_queue(job)?;

        log_info(
            COMPONENT,
            "partitioning",
            &job.job_id,
            json!({
                "stage": DispatchStage::Partitioning,
                "bound": bound,
                "expected_blocks": block_count(bound, self.config.block_size),
            }),
        );
        let tally = BatchPublisher::new(self.gateway, self.tokens).publish_all(
            &job.job_id,
            &queue,
            partition(job, bound, self.config.block_size),
        );

        let summary = DispatchSummary {
            blocks: tally.blocks,
            batches: tally.batches,
        };
        log_info(
            COMPONENT,
            "dispatch_completed",
            &job.job_id,
            json!({
                "stage": DispatchStage::Dispatched,
                "blocks": summary.blocks,
                "batches": summary.batches,
                "failed_batches": tally.failed_batches,
                "dropped_blocks": tally.dropped_blocks,
                "duration_ms": started_at.elapsed().as_millis(),
            }),
        );

        let (stage, summary_error) = match self.write_summary(job, summary) {
            Ok(()) => (DispatchStage::Summarized, None),
            Err(error) => (DispatchStage::Dispatched, Some(error.to_string())),
        };

        Ok(DispatchReport {
            job_id: job.job_id.clone(),
            queue_name: queue.name,
            stage,
            summary,
            failed_batches: tally.failed_batches,
            dropped_blocks: tally.dropped_blocks,
            summary_error,
        })
    }

    fn create_queue(&self, job: &Job) -> Result<QueueHandle, DispatchError> {
        let name = queue_name(&self.config.queue_prefix, &job.job_id);
        let attributes = QueueAttributes::for_dispatch(self.config.visibility_timeout_seconds);

        match self.gateway.create_queue(&name, &attributes) {
            Ok(queue) => {
                log_info(
                    COMPONENT,
                    "queue_created",
                    &job.job_id,
                    json!({
                        "queue_name": queue.name.clone(),
                        "queue_url": queue.url.clone(),
                        "stage": DispatchStage::QueueReady,
                    }),
                );
                Ok(queue)
            }
            Err(message) => {
                log_error(
                    COMPONENT,
                    "queue_creation_failed",
                    &job.job_id,
                    json!({ "queue_name": name.clone(), "error": message.clone() }),
                );
                Err(DispatchError::QueueCreation {
                    queue_name: name,
                    message,
                })
            }
        }
    }

    fn write_summary(&self, job: &Job, summary: DispatchSummary) -> Result<(), DispatchError> {
        let (segments, file_name) = summary_location(&job.job_id);
        let key = object_key(&segments, file_name);
        let body = stable_contract_json(summary);

        match self
            .summary_store
            .write(&segments, file_name, body.as_bytes())
        {
            Ok(()) => {
                log_info(
                    COMPONENT,
                    "summary_written",
                    &job.job_id,
                    json!({ "key": key, "stage": DispatchStage::Summarized }),
                );
                Ok(())
            }
            Err(message) => {
                log_error(
                    COMPONENT,
                    "summary_write_failed",
                    &job.job_id,
                    json!({ "key": key.clone(), "error": message.clone() }),
                );
                Err(DispatchError::SummaryWrite { key, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use seed_sweep_core::partition::BlockSize;
    use seed_sweep_core::tokens::RandomTokens;

    use crate::adapters::queue::{BatchReceipt, QueueEntry};

    use super::*;

    #[derive(Default)]
    struct RecordingGateway {
        created: Mutex<Vec<(String, QueueAttributes)>>,
        batch_sizes: Mutex<Vec<usize>>,
        fail_create: bool,
    }

    impl QueueGateway for RecordingGateway {
        fn create_queue(
            &self,
            name: &str,
            attributes: &QueueAttributes,
        ) -> Result<QueueHandle, String> {
            self.created
                .lock()
                .expect("poisoned mutex")
                .push((name.to_string(), *attributes));
            if self.fail_create {
                return Err("QueueDeletedRecently".to_string());
            }
            Ok(QueueHandle {
                name: name.to_string(),
                url: format!("https://queue.local/{name}"),
            })
        }

        fn publish_batch(
            &self,
            _queue: &QueueHandle,
            entries: &[QueueEntry],
        ) -> Result<BatchReceipt, String> {
            self.batch_sizes
                .lock()
                .expect("poisoned mutex")
                .push(entries.len());
            Ok(BatchReceipt {
                accepted: entries.len(),
                failed: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<HashMap<String, Vec<u8>>>,
        fail: bool,
    }

    impl RecordingStore {
        fn body(&self, key: &str) -> Option<Vec<u8>> {
            self.writes
                .lock()
                .expect("poisoned mutex")
                .get(key)
                .cloned()
        }
    }

    impl SummaryStore for RecordingStore {
        fn write(&self, segments: &[String], file_name: &str, body: &[u8]) -> Result<(), String> {
            if self.fail {
                return Err("AccessDenied".to_string());
            }
            self.writes
                .lock()
                .expect("poisoned mutex")
                .insert(object_key(segments, file_name), body.to_vec());
            Ok(())
        }
    }

    fn sample_job(prng: &str) -> Job {
        Job {
            job_id: "c0ffee".to_string(),
            observations: vec![1, 2, 3],
            prng: prng.to_string(),
            depth: 100,
        }
    }

    fn small_config() -> DispatchConfig {
        DispatchConfig {
            block_size: BlockSize::new(100_000_000).expect("non-zero"),
            ..DispatchConfig::default()
        }
    }

    #[test]
    fn dispatches_and_summarizes() {
        let seed_space = SeedSpaceModel::default();
        let config = small_config();
        let gateway = RecordingGateway::default();
        let store = RecordingStore::default();
        let coordinator =
            DispatchCoordinator::new(&seed_space, &config, &gateway, &store, &RandomTokens);

        let report = coordinator
            .run(&sample_job("mt19937"))
            .expect("dispatch should succeed");

        // ceil(0xffffffff / 100_000_000) = 43 blocks.
        assert_eq!(report.stage, DispatchStage::Summarized);
        assert_eq!(report.summary, DispatchSummary { blocks: 43, batches: 5 });
        assert_eq!(report.queue_name, "seed_sweep_c0ffee.fifo");
        assert_eq!(
            *gateway.batch_sizes.lock().expect("poisoned mutex"),
            vec![10, 10, 10, 10, 3]
        );
        assert_eq!(
            store.body("c0ffee/block-info.json"),
            Some(br#"{"blocks":43,"batches":5}"#.to_vec())
        );
    }

    #[test]
    fn queue_uses_configured_attributes() {
        let seed_space = SeedSpaceModel::default();
        let config = DispatchConfig {
            visibility_timeout_seconds: 900,
            queue_prefix: "f5_".to_string(),
            ..small_config()
        };
        let gateway = RecordingGateway::default();
        let store = RecordingStore::default();

        DispatchCoordinator::new(&seed_space, &config, &gateway, &store, &RandomTokens)
            .run(&sample_job("ruby-rand"))
            .expect("dispatch should succeed");

        let created = gateway.created.lock().expect("poisoned mutex").clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "f5_c0ffee.fifo");
        assert_eq!(created[0].1, QueueAttributes::for_dispatch(900));
    }

    #[test]
    fn unsupported_prng_touches_no_collaborator() {
        let seed_space = SeedSpaceModel::default();
        let config = small_config();
        let gateway = RecordingGateway::default();
        let store = RecordingStore::default();

        let error = DispatchCoordinator::new(&seed_space, &config, &gateway, &store, &RandomTokens)
            .run(&sample_job("xorshift"))
            .expect_err("dispatch should fail");

        assert_eq!(error, DispatchError::UnsupportedPrng("xorshift".to_string()));
        assert!(gateway.created.lock().expect("poisoned mutex").is_empty());
        assert!(gateway.batch_sizes.lock().expect("poisoned mutex").is_empty());
        assert!(store.writes.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn queue_creation_failure_sends_nothing() {
        let seed_space = SeedSpaceModel::default();
        let config = small_config();
        let gateway = RecordingGateway {
            fail_create: true,
            ..RecordingGateway::default()
        };
        let store = RecordingStore::default();

        let error = DispatchCoordinator::new(&seed_space, &config, &gateway, &store, &RandomTokens)
            .run(&sample_job("mt19937"))
            .expect_err("dispatch should fail");

        assert!(matches!(error, DispatchError::QueueCreation { .. }));
        assert!(gateway.batch_sizes.lock().expect("poisoned mutex").is_empty());
        assert!(store.writes.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn summary_failure_keeps_job_dispatched() {
        let seed_space = SeedSpaceModel::default();
        let config = small_config();
        let gateway = RecordingGateway::default();
        let store = RecordingStore {
            fail: true,
            ..RecordingStore::default()
        };

        let report = DispatchCoordinator::new(&seed_space, &config, &gateway, &store, &RandomTokens)
            .run(&sample_job("glibc-rand"))
            .expect("dispatch should still succeed");

        assert_eq!(report.stage, DispatchStage::Dispatched);
        assert_eq!(report.summary.blocks, 43);
        assert!(report
            .summary_error
            .as_deref()
            .is_some_and(|message| message.contains("AccessDenied")));
    }

    #[test]
    fn stages_are_ordered() {
        assert!(DispatchStage::Created < DispatchStage::QueueReady);
        assert!(DispatchStage::Partitioning < DispatchStage::Dispatched);
        assert!(DispatchStage::Dispatched < DispatchStage::Summarized);
    }
}
