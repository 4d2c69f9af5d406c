use std::env;
use std::time::Duration;

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

/// Tuning knobs for the bulk write path.
#[derive(Debug, Clone)]
pub struct BulkConfig {
    /// Upper bound for one complete `COPY` (stream + finish).
    pub copy_timeout: Duration,
    /// Upper bound for DDL and set-based UPDATE statements.
    pub command_timeout: Duration,
    /// Rows sent per `COPY` round trip.
    pub copy_batch_size: usize,
    /// Rows between progress notifications.
    pub copy_notify_after: usize,
    /// Records per parallel unit when generating new customers.
    pub create_chunk_size: usize,
    /// Records per parallel unit when refreshing existing customers.
    pub update_chunk_size: usize,
    /// Largest `quantity` a single request may ask for.
    pub max_quantity: usize,
    pub enable_admin_routes: bool,
}

impl BulkConfig {
    pub fn from_env() -> Self {
        Self {
            copy_timeout: env_duration_secs("BULK_COPY_TIMEOUT_SECS", 300),
            command_timeout: env_duration_secs("BULK_COMMAND_TIMEOUT_SECS", 120),
            copy_batch_size: env_usize("BULK_COPY_BATCH_SIZE", 2_000),
            copy_notify_after: env_usize("BULK_COPY_NOTIFY_AFTER", 1_000),
            create_chunk_size: env_usize("BULK_CREATE_CHUNK_SIZE", 500),
            update_chunk_size: env_usize("BULK_UPDATE_CHUNK_SIZE", 100),
            max_quantity: env_usize("BULK_MAX_QUANTITY", 1_000_000),
            enable_admin_routes: env_bool("BULK_ENABLE_ADMIN_ROUTES", false),
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
