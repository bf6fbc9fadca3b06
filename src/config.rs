//! Runtime configuration resolved from CLI flags with environment fallbacks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::entities::stats::DEFAULT_STATS_SAMPLE_SIZE;

pub const DATASET_ENV: &str = "MEDDB_DATASET";
pub const LOAD_TIMEOUT_ENV: &str = "MEDDB_LOAD_TIMEOUT_SECS";
pub const STATS_SAMPLE_ENV: &str = "MEDDB_STATS_SAMPLE";

pub const DEFAULT_DATASET_FILE: &str = "drugs_side_effects.csv";
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    pub load_timeout: Duration,
    pub stats_sample_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_FILE),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            stats_sample_size: DEFAULT_STATS_SAMPLE_SIZE,
        }
    }
}

impl AppConfig {
    /// Builds a config where explicit flags win over environment variables,
    /// which win over built-in defaults.
    pub fn resolve(
        dataset: Option<PathBuf>,
        load_timeout_secs: Option<u64>,
        stats_sample_size: Option<usize>,
    ) -> Self {
        let dataset_path = dataset
            .or_else(|| env_value(DATASET_ENV).map(PathBuf::from))
            .unwrap_or_else(default_dataset_path);
        let load_timeout = load_timeout_secs
            .or_else(|| env_value(LOAD_TIMEOUT_ENV).and_then(|v| v.parse().ok()))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOAD_TIMEOUT);
        let stats_sample_size = stats_sample_size
            .or_else(|| env_value(STATS_SAMPLE_ENV).and_then(|v| v.parse().ok()))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_STATS_SAMPLE_SIZE);

        Self {
            dataset_path,
            load_timeout,
            stats_sample_size,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Prefers the working directory copy; falls back to the per-user data dir
/// when only that one exists.
fn default_dataset_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_DATASET_FILE);
    if local.exists() {
        return local;
    }
    match dirs::data_dir().map(|dir| user_dataset_path(&dir)) {
        Some(path) if path.exists() => path,
        _ => local,
    }
}

fn user_dataset_path(data_dir: &Path) -> PathBuf {
    data_dir.join("meddb").join(DEFAULT_DATASET_FILE)
}
