use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::{DatasetSnapshot, DatasetStatus};

/// Distributions are computed over this many leading records unless configured otherwise.
pub const DEFAULT_STATS_SAMPLE_SIZE: usize = 1000;
pub const UNKNOWN_VALUE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    /// Size of the whole dataset, not just the sampled prefix.
    pub total_drugs: usize,
    pub sampled: usize,
    pub rx_otc_distribution: BTreeMap<String, usize>,
    pub pregnancy_categories: BTreeMap<String, usize>,
    pub drug_classes: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatsOutcome {
    Loading { message: String },
    Loaded(StatsReport),
}

impl StatsOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, StatsOutcome::Loaded(_))
    }
}

pub(crate) fn not_loaded_message(snapshot: &DatasetSnapshot) -> String {
    match (snapshot.status(), snapshot.last_error()) {
        (DatasetStatus::Failed, Some(err)) => format!("Drug database failed to load: {err}"),
        _ => "Drug database is still loading. Please try again shortly.".to_string(),
    }
}

/// Counts the observed value as-is; only blank values collapse to `unknown`.
fn bump(counts: &mut BTreeMap<String, usize>, value: &str) {
    let key = if value.trim().is_empty() {
        UNKNOWN_VALUE
    } else {
        value
    };
    *counts.entry(key.to_string()).or_default() += 1;
}

/// Counts categorical values over the first `sample_size` records.
///
/// The prefix is deterministic, so distributions for datasets larger than the
/// sample are approximate.
pub fn compute_stats(snapshot: &DatasetSnapshot, sample_size: usize) -> StatsOutcome {
    if !snapshot.is_loaded() {
        return StatsOutcome::Loading {
            message: not_loaded_message(snapshot),
        };
    }

    let records = snapshot.records();
    let sample = &records[..records.len().min(sample_size)];

    let mut rx_otc_distribution = BTreeMap::new();
    let mut pregnancy_categories = BTreeMap::new();
    let mut drug_classes = BTreeMap::new();
    for record in sample {
        bump(&mut rx_otc_distribution, &record.rx_otc);
        bump(&mut pregnancy_categories, &record.pregnancy_category);
        bump(&mut drug_classes, &record.drug_class);
    }

    StatsOutcome::Loaded(StatsReport {
        total_drugs: records.len(),
        sampled: sample.len(),
        rx_otc_distribution,
        pregnancy_categories,
        drug_classes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetStore, DrugRecord};

    fn record(rx_otc: &str, pregnancy: &str, drug_class: &str) -> DrugRecord {
        DrugRecord {
            name: "x".into(),
            rx_otc: rx_otc.into(),
            pregnancy_category: pregnancy.into(),
            drug_class: drug_class.into(),
            ..Default::default()
        }
    }

    fn loaded(outcome: StatsOutcome) -> StatsReport {
        match outcome {
            StatsOutcome::Loaded(report) => report,
            StatsOutcome::Loading { message } => panic!("expected report, got loading: {message}"),
        }
    }

    #[test]
    fn counts_values_and_substitutes_unknown() {
        let snapshot = DatasetStore::from_records(vec![
            record("OTC", "C", "Analgesics"),
            record("Rx", "", "Anticoagulants"),
            record("OTC", "B", "  "),
        ])
        .snapshot();

        let report = loaded(compute_stats(&snapshot, DEFAULT_STATS_SAMPLE_SIZE));
        assert_eq!(report.total_drugs, 3);
        assert_eq!(report.rx_otc_distribution.get("OTC"), Some(&2));
        assert_eq!(report.rx_otc_distribution.get("Rx"), Some(&1));
        assert_eq!(report.pregnancy_categories.get(UNKNOWN_VALUE), Some(&1));
        assert_eq!(report.drug_classes.get(UNKNOWN_VALUE), Some(&1));
    }

    #[test]
    fn total_covers_full_dataset_while_distribution_covers_prefix() {
        let records = (0..5000)
            .map(|i| record(if i < 1000 { "Rx" } else { "OTC" }, "C", "class"))
            .collect();
        let snapshot = DatasetStore::from_records(records).snapshot();

        let report = loaded(compute_stats(&snapshot, DEFAULT_STATS_SAMPLE_SIZE));
        assert_eq!(report.total_drugs, 5000);
        assert_eq!(report.sampled, 1000);
        for dist in [
            &report.rx_otc_distribution,
            &report.pregnancy_categories,
            &report.drug_classes,
        ] {
            assert_eq!(dist.values().sum::<usize>(), 1000);
        }
        // Deterministic prefix: none of the OTC rows past index 1000 are sampled.
        assert_eq!(report.rx_otc_distribution.get("OTC"), None);
    }

    #[test]
    fn custom_sample_size_is_respected() {
        let records = (0..10).map(|_| record("Rx", "C", "c")).collect();
        let snapshot = DatasetStore::from_records(records).snapshot();
        let report = loaded(compute_stats(&snapshot, 4));
        assert_eq!(report.sampled, 4);
        assert_eq!(report.total_drugs, 10);
    }

    #[test]
    fn unloaded_snapshot_reports_loading() {
        let store = DatasetStore::new("/nonexistent.csv", std::time::Duration::from_secs(1));
        let outcome = compute_stats(&store.snapshot(), DEFAULT_STATS_SAMPLE_SIZE);
        assert!(!outcome.is_loaded());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "loading");
        assert!(json["message"].as_str().unwrap().contains("still loading"));
    }

    #[test]
    fn observed_values_are_not_normalized() {
        let snapshot = DatasetStore::from_records(vec![
            record("OTC", "C", "c"),
            record("OTC ", "C", "c"),
            record(" ", "C", "c"),
        ])
        .snapshot();
        let report = loaded(compute_stats(&snapshot, 1000));
        assert_eq!(report.rx_otc_distribution.get("OTC"), Some(&1));
        assert_eq!(report.rx_otc_distribution.get("OTC "), Some(&1));
        assert_eq!(report.rx_otc_distribution.get(UNKNOWN_VALUE), Some(&1));
    }

    #[test]
    fn loaded_report_serializes_with_status_tag() {
        let snapshot = DatasetStore::from_records(vec![record("OTC", "C", "c")]).snapshot();
        let json = serde_json::to_value(compute_stats(&snapshot, 1000)).unwrap();
        assert_eq!(json["status"], "loaded");
        assert_eq!(json["total_drugs"], 1);
        assert_eq!(json["rx_otc_distribution"]["OTC"], 1);
    }
}
