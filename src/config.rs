use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::poster::PlatformEndpoints;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tracing: TracingConfig,
    pub database: DatabaseConfig,
    pub jobs: JobsConfig,
    pub server: ServerConfig,
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracingConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins the browser UI is served from, e.g. `http://localhost:3000`
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// How posts reach their platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeliveryConfig {
    /// Mock poster that captures posts for testing
    Mock,
    /// Real HTTP delivery to the platform APIs
    Http {
        #[serde(default)]
        endpoints: PlatformEndpoints,
        credentials: PlatformCredentials,
    },
}

/// Per-platform API credentials. Injected through `APP_*` environment
/// overrides in production rather than checked into config files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlatformCredentials {
    #[serde(default)]
    pub twitter_bearer_token: String,
    #[serde(default)]
    pub facebook_access_token: String,
    #[serde(default)]
    pub instagram_access_token: String,
    #[serde(default)]
    pub linkedin_access_token: String,
    /// `urn:li:person:{id}` author of LinkedIn posts
    #[serde(default)]
    pub linkedin_author_urn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub purge: PurgeConfig,
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeConfig {
    /// Retention period for completed jobs in seconds (default: 7200 = 2 hours)
    #[serde(default = "default_completed_retention")]
    pub completed_retention_seconds: u64,
    /// Retention period for failed jobs in seconds (default: 172800 = 2 days)
    #[serde(default = "default_failed_retention")]
    pub failed_retention_seconds: u64,
    /// Maximum number of jobs to delete in a single batch (default: 1000)
    #[serde(default = "default_purge_batch_size")]
    pub batch_size: usize,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            completed_retention_seconds: default_completed_retention(),
            failed_retention_seconds: default_failed_retention(),
            batch_size: default_purge_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    #[serde(flatten)]
    pub workers: HashMap<String, WorkerQueueConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerQueueConfig {
    pub jobs: Vec<String>,
    pub count: u32,
    /// Job execution timeout in seconds (default: 300)
    #[serde(default = "default_job_timeout")]
    pub job_timeout: u32,
    /// Total attempt budget per job; transient failures retry until it
    /// is spent (default: 4)
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    /// Base delay in seconds before first retry (default: 60)
    #[serde(default = "default_base_retry_delay")]
    pub base_retry_delay_seconds: u64,
    /// Exponential backoff multiplier (default: 5)
    #[serde(default = "default_retry_multiplier")]
    pub retry_backoff_multiplier: u64,
}

const fn default_max_retries() -> i32 {
    4
}

const fn default_job_timeout() -> u32 {
    300 // 5 minutes
}

const fn default_base_retry_delay() -> u64 {
    60
}

const fn default_retry_multiplier() -> u64 {
    5
}

const fn default_completed_retention() -> u64 {
    7200 // 2 hours
}

const fn default_failed_retention() -> u64 {
    172_800 // 2 days
}

const fn default_purge_batch_size() -> usize {
    1000
}
