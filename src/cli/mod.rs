//! Command-line surface: run the HTTP service or query a dataset directly.

pub mod health;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::types::search_envelope;
use crate::config::AppConfig;
use crate::dataset::DatasetStore;
use crate::entities::drug::{DrugSearchFilters, search_query_summary};
use crate::entities::recommend::{DEFAULT_TOP_K, recommend, split_symptoms};
use crate::entities::stats::{StatsOutcome, compute_stats};
use crate::error::MedDbError;
use crate::render;

#[derive(Parser, Debug)]
#[command(
    name = "meddb",
    version,
    about = "Search, filter and summarize a drug side-effects dataset"
)]
pub struct Cli {
    /// Emit JSON instead of Markdown
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the drug API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// Dataset CSV path (falls back to MEDDB_DATASET)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Seconds to wait for the dataset before giving up
        #[arg(long)]
        load_timeout: Option<u64>,
        /// Records examined by the stats route
        #[arg(long)]
        stats_sample: Option<usize>,
        /// Defer loading until the first dataset request
        #[arg(long)]
        lazy: bool,
    },
    /// Search drugs by free text and categorical filters
    Search {
        /// Free-text term matched against name, indication and side effects
        query: Option<String>,
        #[arg(long)]
        rx_otc: Option<String>,
        #[arg(long)]
        pregnancy_category: Option<String>,
        #[arg(long)]
        csa: Option<String>,
        #[arg(long)]
        alcohol: Option<String>,
        #[arg(long)]
        drug_class: Option<String>,
        #[arg(short, long, default_value_t = crate::entities::drug::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Summarize categorical distributions
    Stats {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        stats_sample: Option<usize>,
    },
    /// Rank drugs whose indication mentions the given symptoms
    Recommend {
        /// Symptoms separated by commas or semicolons
        symptoms: String,
        /// Free-form context echoed back with the result
        #[arg(long)]
        info: Option<String>,
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Check a running server, or the local dataset with --local
    Health {
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        url: String,
        #[arg(long)]
        local: bool,
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn loaded_store(config: &AppConfig) -> Result<DatasetStore, MedDbError> {
    let store = DatasetStore::from_config(config);
    store.load().await?;
    Ok(store)
}

/// Runs a non-server subcommand and returns its rendered output.
///
/// # Errors
///
/// Returns an error when the dataset cannot be loaded, arguments are invalid,
/// or rendering fails.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let json = cli.json;
    match cli.command {
        Commands::Serve {
            host,
            port,
            data,
            load_timeout,
            stats_sample,
            lazy,
        } => {
            let config = AppConfig::resolve(data, load_timeout, stats_sample);
            crate::api::run_http(&host, port, config, !lazy).await?;
            Ok(String::new())
        }
        Commands::Search {
            query,
            rx_otc,
            pregnancy_category,
            csa,
            alcohol,
            drug_class,
            limit,
            data,
        } => {
            if limit == 0 {
                return Err(MedDbError::InvalidArgument("--limit must be at least 1".into()).into());
            }
            let config = AppConfig::resolve(data, None, None);
            let store = loaded_store(&config).await?;
            let filters = DrugSearchFilters {
                query: blank_to_none(query),
                rx_otc: blank_to_none(rx_otc),
                pregnancy_category: blank_to_none(pregnancy_category),
                csa: blank_to_none(csa),
                alcohol: blank_to_none(alcohol),
                drug_class: blank_to_none(drug_class),
            };
            let summary = search_query_summary(&filters);
            let response = search_envelope(&store.snapshot(), filters, limit);
            if json {
                return Ok(render::json::to_pretty(&response)?);
            }
            Ok(render::markdown::drug_search_markdown(&summary, &response)?)
        }
        Commands::Stats { data, stats_sample } => {
            let config = AppConfig::resolve(data, None, stats_sample);
            let store = loaded_store(&config).await?;
            let outcome = compute_stats(&store.snapshot(), config.stats_sample_size);
            if json {
                return Ok(render::json::to_pretty(&outcome)?);
            }
            match outcome {
                StatsOutcome::Loaded(report) => Ok(render::markdown::stats_markdown(&report)?),
                StatsOutcome::Loading { message } => {
                    Err(MedDbError::NotLoaded { reason: message }.into())
                }
            }
        }
        Commands::Recommend {
            symptoms,
            info,
            top_k,
            data,
        } => {
            let symptoms = split_symptoms(&symptoms);
            if symptoms.is_empty() {
                return Err(MedDbError::InvalidArgument("Symptoms are required".into()).into());
            }
            let config = AppConfig::resolve(data, None, None);
            let store = loaded_store(&config).await?;
            let rec = recommend(&store.snapshot(), &symptoms, info.as_deref(), top_k.max(1))?;
            if json {
                return Ok(render::json::to_pretty(&rec)?);
            }
            Ok(render::markdown::recommend_markdown(&rec)?)
        }
        Commands::Health { url, local, data } => {
            let report = if local {
                let config = AppConfig::resolve(data, None, None);
                health::check_local(&config).await
            } else {
                health::check_remote(&url).await?
            };
            if json {
                return Ok(render::json::to_pretty(&report)?);
            }
            Ok(report.to_markdown())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    fn dataset() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"drug_name,medical_condition,rx_otc,pregnancy_category\n\
Aspirin,pain and fever,OTC,C\n\
Warfarin,blood clots,Rx,X\n\
Acetaminophen,fever,OTC,B\n",
        )
        .unwrap();
        file.flush().unwrap();
        file
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn serve_defaults() {
        let cli = parse(&["meddb", "serve"]);
        match cli.command {
            Commands::Serve {
                host, port, lazy, ..
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 5000);
                assert!(!lazy);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = parse(&["meddb", "stats", "--json"]);
        assert!(cli.json);
    }

    #[tokio::test]
    async fn search_renders_markdown() {
        let file = dataset();
        let path = file.path().to_str().unwrap();
        let cli = parse(&["meddb", "search", "--rx-otc", "otc", "--data", path]);
        let out = run(cli).await.unwrap();
        assert!(out.contains("# Drugs: rx_otc=otc"));
        assert!(out.contains("| Aspirin |"));
        assert!(out.contains("| Acetaminophen |"));
        assert!(!out.contains("Warfarin"));
    }

    #[tokio::test]
    async fn search_renders_json() {
        let file = dataset();
        let path = file.path().to_str().unwrap();
        let cli = parse(&["meddb", "--json", "search", "fever", "--limit", "1", "--data", path]);
        let out = run(cli).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["showing"], 1);
        assert_eq!(value["results"][0]["drug_name"], "Aspirin");
    }

    #[tokio::test]
    async fn search_rejects_zero_limit() {
        let cli = parse(&["meddb", "search", "--limit", "0"]);
        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("--limit"));
    }

    #[tokio::test]
    async fn missing_dataset_is_an_error() {
        let cli = parse(&["meddb", "stats", "--data", "/nonexistent/drugs.csv"]);
        let err = run(cli).await.unwrap_err();
        let err = err.downcast_ref::<MedDbError>().unwrap();
        assert!(matches!(err, MedDbError::DatasetMissing { .. }));
    }

    #[tokio::test]
    async fn stats_render_counts() {
        let file = dataset();
        let path = file.path().to_str().unwrap();
        let out = run(parse(&["meddb", "stats", "--data", path])).await.unwrap();
        assert!(out.contains("Total drugs: 3"));
        assert!(out.contains("| OTC | 2 |"));
    }

    #[tokio::test]
    async fn recommend_ranks_by_symptoms() {
        let file = dataset();
        let path = file.path().to_str().unwrap();
        let cli = parse(&["meddb", "--json", "recommend", "fever, pain", "--data", path]);
        let out = run(cli).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["medications"][0]["drug_name"], "Aspirin");
        assert_eq!(value["medications"][0]["confidence"], "High");
        assert_eq!(value["total_matches"], 2);
    }

    #[tokio::test]
    async fn recommend_requires_symptoms() {
        let err = run(parse(&["meddb", "recommend", " , "])).await.unwrap_err();
        assert!(err.to_string().contains("Symptoms are required"));
    }
}
