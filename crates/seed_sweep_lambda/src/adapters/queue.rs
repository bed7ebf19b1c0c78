use seed_sweep_core::config::MESSAGE_RETENTION_SECONDS;

/// Attributes of the per-job work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAttributes {
    pub visibility_timeout_seconds: u32,
    pub retention_seconds: u32,
    /// Ordered delivery with content deduplication (a FIFO queue).
    pub ordered_and_deduplicating: bool,
}

impl QueueAttributes {
    pub fn for_dispatch(visibility_timeout_seconds: u32) -> Self {
        Self {
            visibility_timeout_seconds,
            retention_seconds: MESSAGE_RETENTION_SECONDS,
            ordered_and_deduplicating: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    pub name: String,
    pub url: String,
}

/// One message of a batch publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub entry_id: String,
    pub body: String,
    pub group_token: String,
    pub dedup_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub entry_id: String,
    pub message: String,
}

/// Result of a batch call the transport accepted. Individual entries can
/// still be rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReceipt {
    pub accepted: usize,
    pub failed: Vec<FailedEntry>,
}

pub trait QueueGateway {
    fn create_queue(&self, name: &str, attributes: &QueueAttributes)
        -> Result<QueueHandle, String>;

    /// Publishes between 1 and 10 entries in one call.
    fn publish_batch(
        &self,
        queue: &QueueHandle,
        entries: &[QueueEntry],
    ) -> Result<BatchReceipt, String>;
}
