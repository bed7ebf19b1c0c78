use crate::error::ConfigError;
use crate::partition::BlockSize;
use crate::storage_keys::DEFAULT_QUEUE_PREFIX;
use crate::tokens::TokenMode;

pub const BLOCK_SIZE_VAR: &str = "SEED_SWEEP_BLOCK_SIZE";
pub const VISIBILITY_TIMEOUT_VAR: &str = "SEED_SWEEP_VISIBILITY_TIMEOUT";
pub const TARGET_REGION_VAR: &str = "SEED_SWEEP_TARGET_AWS_REGION";
pub const AWS_REGION_VAR: &str = "AWS_REGION";
pub const QUEUE_ENDPOINT_URL_VAR: &str = "SEED_SWEEP_QUEUE_ENDPOINT_URL";
pub const QUEUE_PREFIX_VAR: &str = "SEED_SWEEP_QUEUE_PREFIX";
pub const RESULTS_BUCKET_VAR: &str = "SEED_SWEEP_RESULTS_BUCKET";
pub const DEDUP_TOKENS_VAR: &str = "SEED_SWEEP_DEDUP_TOKENS";
pub const DISPATCH_FUNCTION_VAR: &str = "SEED_SWEEP_DISPATCH_FUNCTION";

pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u32 = 60 * 30;
/// 14 days, the longest retention the queue transport allows.
pub const MESSAGE_RETENTION_SECONDS: u32 = 1_209_600;
pub const DEFAULT_RESULTS_BUCKET: &str = "seed-sweep-untwister";
pub const DEFAULT_DISPATCH_FUNCTION: &str = "seed_sweep_dispatch";

/// Settings for the dispatch function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub block_size: BlockSize,
    pub visibility_timeout_seconds: u32,
    pub target_region: Option<String>,
    /// Overrides the queue transport endpoint, e.g. a local SQS emulator.
    pub queue_endpoint_url: Option<String>,
    pub queue_prefix: String,
    pub results_bucket: String,
    pub token_mode: TokenMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            block_size: BlockSize::default(),
            visibility_timeout_seconds: DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
            target_region: None,
            queue_endpoint_url: None,
            queue_prefix: DEFAULT_QUEUE_PREFIX.to_string(),
            results_bucket: DEFAULT_RESULTS_BUCKET.to_string(),
            token_mode: TokenMode::default(),
        }
    }
}

impl DispatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let visibility_timeout_seconds = lookup(VISIBILITY_TIMEOUT_VAR)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT_SECONDS);

        let target_region = non_empty(lookup(TARGET_REGION_VAR))
            .or_else(|| non_empty(lookup(AWS_REGION_VAR)));

        Ok(Self {
            block_size: BlockSize::from_setting(lookup(BLOCK_SIZE_VAR).as_deref()),
            visibility_timeout_seconds,
            target_region,
            queue_endpoint_url: non_empty(lookup(QUEUE_ENDPOINT_URL_VAR)),
            queue_prefix: non_empty(lookup(QUEUE_PREFIX_VAR))
                .unwrap_or_else(|| DEFAULT_QUEUE_PREFIX.to_string()),
            results_bucket: non_empty(lookup(RESULTS_BUCKET_VAR))
                .unwrap_or_else(|| DEFAULT_RESULTS_BUCKET.to_string()),
            token_mode: TokenMode::from_setting(lookup(DEDUP_TOKENS_VAR).as_deref())?,
        })
    }
}

/// Settings for the start (submission) function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartConfig {
    pub dispatch_function: String,
}

impl StartConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            dispatch_function: non_empty(lookup(DISPATCH_FUNCTION_VAR))
                .unwrap_or_else(|| DEFAULT_DISPATCH_FUNCTION.to_string()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
