use std::sync::OnceLock;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::AppConfig;
use crate::dataset::DatasetStore;
use crate::error::MedDbError;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthRow {
    pub check: String,
    pub status: String,
    pub detail: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub healthy: usize,
    pub total: usize,
    pub rows: Vec<HealthRow>,
}

impl HealthReport {
    fn from_rows(rows: Vec<HealthRow>) -> Self {
        let healthy = rows.iter().filter(|r| r.status == "ok").count();
        Self {
            healthy,
            total: rows.len(),
            rows,
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Drug API Health Check\n\n");
        out.push_str("| Check | Status | Detail |\n");
        out.push_str("|-------|--------|--------|\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                row.check, row.status, row.detail
            ));
        }
        out.push_str(&format!(
            "\nStatus: {}/{} checks healthy\n",
            self.healthy, self.total
        ));
        out
    }
}

/// Subset of the server's `/api/health` body the probe reports on.
#[derive(Debug, Deserialize)]
struct RemoteHealth {
    database_status: String,
    total_drugs: usize,
    #[serde(default)]
    dataset: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn health_http_client() -> Result<reqwest::Client, MedDbError> {
    static HEALTH_HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = HEALTH_HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("meddb-cli/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let _ = HEALTH_HTTP_CLIENT.set(client.clone());
    Ok(client)
}

fn health_url(base: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    if base.ends_with("/api/health") {
        base.to_string()
    } else {
        format!("{base}/api/health")
    }
}

async fn probe_server(client: reqwest::Client, base: &str) -> Vec<HealthRow> {
    let url = health_url(base);
    let start = Instant::now();
    let resp = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await;

    let resp = match resp {
        Ok(resp) => resp,
        Err(err) => {
            let reason = if err.is_timeout() {
                "timeout"
            } else if err.is_connect() {
                "connect"
            } else {
                "error"
            };
            return vec![HealthRow {
                check: format!("API ({url})"),
                status: "error".into(),
                detail: reason.into(),
            }];
        }
    };

    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    if !status.is_success() {
        return vec![HealthRow {
            check: format!("API ({url})"),
            status: "error".into(),
            detail: format!("{elapsed}ms (HTTP {})", status.as_u16()),
        }];
    }

    let api_row = HealthRow {
        check: format!("API ({url})"),
        status: "ok".into(),
        detail: format!("{elapsed}ms"),
    };
    let dataset_row = match resp.json::<RemoteHealth>().await {
        Ok(body) => dataset_row(
            body.dataset.as_deref().unwrap_or("server dataset"),
            body.database_status == "loaded",
            &body.database_status,
            body.total_drugs,
            body.error.as_deref(),
        ),
        Err(err) => HealthRow {
            check: "Dataset".into(),
            status: "error".into(),
            detail: format!("unreadable health body: {err}"),
        },
    };
    vec![api_row, dataset_row]
}

fn dataset_row(
    name: &str,
    loaded: bool,
    state: &str,
    total: usize,
    error: Option<&str>,
) -> HealthRow {
    let detail = match error {
        Some(err) if !loaded => format!("{state}: {err}"),
        _ => format!("{state}, {total} drugs"),
    };
    HealthRow {
        check: format!("Dataset ({name})"),
        status: if loaded { "ok" } else { "error" }.into(),
        detail,
    }
}

async fn check_local_dataset(config: &AppConfig) -> HealthRow {
    let store = DatasetStore::from_config(config);
    let name = store.path().display().to_string();
    let start = Instant::now();
    match store.load().await {
        Ok(()) => {
            let snapshot = store.snapshot();
            let mut row = dataset_row(&name, true, "loaded", snapshot.total(), None);
            row.detail = format!("{} in {}ms", row.detail, start.elapsed().as_millis());
            row
        }
        Err(err) => dataset_row(&name, false, "unavailable", 0, Some(&err.to_string())),
    }
}

/// Probes a running server's `/api/health` route.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be created.
pub async fn check_remote(base_url: &str) -> Result<HealthReport, MedDbError> {
    let client = health_http_client()?;
    Ok(HealthReport::from_rows(probe_server(client, base_url).await))
}

/// Loads the configured dataset in-process instead of contacting a server.
pub async fn check_local(config: &AppConfig) -> HealthReport {
    HealthReport::from_rows(vec![check_local_dataset(config).await])
}
