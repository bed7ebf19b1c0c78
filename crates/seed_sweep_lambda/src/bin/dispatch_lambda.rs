use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_sqs::types::{QueueAttributeName, SendMessageBatchRequestEntry};
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use seed_sweep_core::config::DispatchConfig;
use seed_sweep_core::contract::Job;
use seed_sweep_core::seed_space::SeedSpaceModel;
use seed_sweep_core::storage_keys::object_key;
use seed_sweep_lambda::adapters::queue::{
    BatchReceipt, FailedEntry, QueueAttributes, QueueEntry, QueueGateway, QueueHandle,
};
use seed_sweep_lambda::adapters::summary_store::SummaryStore;
use seed_sweep_lambda::handlers::dispatch::DispatchCoordinator;
use seed_sweep_lambda::logging::init_logging;
use serde_json::{json, Value};

struct SqsQueueGateway {
    sqs_client: aws_sdk_sqs::Client,
}

impl QueueGateway for SqsQueueGateway {
    fn create_queue(
        &self,
        name: &str,
        attributes: &QueueAttributes,
    ) -> Result<QueueHandle, String> {
        let queue_name = name.to_string();
        let attributes = *attributes;
        let client = self.sqs_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .create_queue()
                    .queue_name(queue_name.clone())
                    .attributes(
                        QueueAttributeName::VisibilityTimeout,
                        attributes.visibility_timeout_seconds.to_string(),
                    )
                    .attributes(
                        QueueAttributeName::MessageRetentionPeriod,
                        attributes.retention_seconds.to_string(),
                    )
                    .attributes(
                        QueueAttributeName::FifoQueue,
                        attributes.ordered_and_deduplicating.to_string(),
                    )
                    .send()
                    .await
                    .map_err(|error| format!("failed to create sqs queue: {error}"))?;

                let url = output
                    .queue_url()
                    .ok_or_else(|| "create queue response is missing a queue url".to_string())?;
                Ok::<_, String>(QueueHandle {
                    name: queue_name,
                    url: url.to_string(),
                })
            })
        })
    }

    fn publish_batch(
        &self,
        queue: &QueueHandle,
        entries: &[QueueEntry],
    ) -> Result<BatchReceipt, String> {
        let request_entries = entries
            .iter()
            .map(|entry| {
                SendMessageBatchRequestEntry::builder()
                    .id(entry.entry_id.clone())
                    .message_body(entry.body.clone())
                    .message_group_id(entry.group_token.clone())
                    .message_deduplication_id(entry.dedup_token.clone())
                    .build()
                    .map_err(|error| format!("invalid sqs batch entry: {error}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let queue_url = queue.url.clone();
        let client = self.sqs_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .send_message_batch()
                    .queue_url(queue_url)
                    .set_entries(Some(request_entries))
                    .send()
                    .await
                    .map_err(|error| format!("failed to send sqs message batch: {error}"))?;

                Ok::<_, String>(BatchReceipt {
                    accepted: output.successful().len(),
                    failed: output
                        .failed()
                        .iter()
                        .map(|entry| FailedEntry {
                            entry_id: entry.id().to_string(),
                            message: format!(
                                "{}: {}",
                                entry.code(),
                                entry.message().unwrap_or_default()
                            ),
                        })
                        .collect(),
                })
            })
        })
    }
}

struct S3SummaryStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl SummaryStore for S3SummaryStore {
    fn write(&self, segments: &[String], file_name: &str, body: &[u8]) -> Result<(), String> {
        let bucket = self.bucket.clone();
        let object_key = object_key(segments, file_name);
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .content_type("application/json")
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    seed_space: &SeedSpaceModel,
    config: &DispatchConfig,
) -> Result<Value, Error> {
    let job: Job = serde_json::from_value(event.payload)
        .map_err(|error| Error::from(format!("invalid job descriptor: {error}")))?;

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = config.target_region.clone() {
        loader = loader.region(aws_config::Region::new(region));
    }
    let aws_config = loader.load().await;

    let mut sqs_config = aws_sdk_sqs::config::Builder::from(&aws_config);
    if let Some(endpoint_url) = config.queue_endpoint_url.clone() {
        sqs_config = sqs_config.endpoint_url(endpoint_url);
    }
    let gateway = SqsQueueGateway {
        sqs_client: aws_sdk_sqs::Client::from_conf(sqs_config.build()),
    };
    let summary_store = S3SummaryStore {
        bucket: config.results_bucket.clone(),
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };
    let tokens = config.token_mode.source();
    let coordinator =
        DispatchCoordinator::new(seed_space, config, &gateway, &summary_store, tokens.as_ref());

    let finished_at =
        |status: &str| json!({ "status": status, "event_time": Utc::now().to_rfc3339() });
    // Failures were already logged with the job id; the invocation itself
    // always succeeds so the runtime does not retry a partial dispatch.
    match coordinator.run(&job) {
        Ok(report) => {
            let mut response = finished_at("dispatched");
            response["report"] = serde_json::to_value(report)
                .map_err(|error| Error::from(format!("failed to serialize report: {error}")))?;
            Ok(response)
        }
        Err(error) => {
            let mut response = finished_at("failed");
            response["job_id"] = Value::from(job.job_id);
            response["error_code"] = Value::from(error.error_code());
            response["error"] = Value::from(error.to_string());
            Ok(response)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();
    let config = DispatchConfig::from_env()?;
    let seed_space = SeedSpaceModel::default();
    let seed_space = &seed_space;
    let config = &config;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, seed_space, config).await
    }))
    .await
}
