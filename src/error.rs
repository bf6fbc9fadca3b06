use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MedDbError {
    #[error("Dataset not found: {path}\n\nSet MEDDB_DATASET or pass --data <path>.")]
    DatasetMissing { path: PathBuf },

    #[error("Dataset parse error in {path}: {source}")]
    DatasetParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Dataset load timed out after {timeout:?}: {path}")]
    LoadTimeout { path: PathBuf, timeout: Duration },

    #[error("Dataset load task failed: {0}")]
    LoadTask(String),

    #[error("Drug database is not loaded yet. {reason}")]
    NotLoaded { reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::MedDbError;

    #[test]
    fn dataset_missing_display_includes_hint() {
        let err = MedDbError::DatasetMissing {
            path: PathBuf::from("/data/drugs.csv"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/data/drugs.csv"));
        assert!(msg.contains("MEDDB_DATASET"));
    }

    #[test]
    fn load_timeout_display_includes_seconds() {
        let err = MedDbError::LoadTimeout {
            path: PathBuf::from("drugs.csv"),
            timeout: Duration::from_secs(30),
        };

        let msg = err.to_string();
        assert!(msg.contains("30s"));
        assert!(msg.contains("drugs.csv"));
    }

    #[test]
    fn load_timeout_display_keeps_subsecond_precision() {
        let err = MedDbError::LoadTimeout {
            path: PathBuf::from("drugs.csv"),
            timeout: Duration::from_millis(250),
        };

        let msg = err.to_string();
        assert!(msg.contains("250ms"));
        assert!(!msg.contains("0s"));
    }

    #[test]
    fn not_loaded_display_includes_reason() {
        let err = MedDbError::NotLoaded {
            reason: "Load is still in progress".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("not loaded yet"));
        assert!(msg.contains("still in progress"));
    }
}
