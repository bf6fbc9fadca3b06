use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::dataset::{DatasetSnapshot, DrugRecord};
use crate::entities::stats::not_loaded_message;
use crate::error::MedDbError;

pub const DEFAULT_TOP_K: usize = 10;

pub const DISCLAIMER: &str = "MEDICAL DISCLAIMER: These recommendations are for educational purposes only. \
Always consult with qualified healthcare professionals before taking any medication. \
Self-medication can be dangerous and may lead to adverse effects.";

pub const SAFETY_WARNINGS: [&str; 4] = [
    "This is for educational purposes only",
    "Always consult a healthcare professional before taking any medication",
    "Verify dosage and interactions with your doctor",
    "Do not self-medicate based on these recommendations",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Confidence::High
        } else if score >= 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Medication {
    pub drug_name: String,
    pub indication: String,
    pub side_effects: String,
    pub score: f64,
    pub dosage: String,
    pub route: String,
    pub confidence: Confidence,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub medications: Vec<Medication>,
    pub symptoms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub total_found: usize,
    pub total_matches: usize,
    pub disclaimer: &'static str,
    pub timestamp: String,
}

fn symptom_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[,;\r\n]+").expect("valid regex"))
}

/// Splits free text like `"fever, headache; nausea"` into symptom terms.
pub fn split_symptoms(text: &str) -> Vec<String> {
    normalize_symptoms(symptom_separator_re().split(text))
}

/// Trims and lowercases terms, dropping blanks. Order and duplicates are kept.
pub fn normalize_symptoms<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

fn to_medication(record: &DrugRecord, score: f64) -> Medication {
    Medication {
        drug_name: or_placeholder(&record.name, "Unknown"),
        indication: or_placeholder(&record.indication, "N/A"),
        side_effects: or_placeholder(&record.side_effects, "N/A"),
        score,
        dosage: or_placeholder(&record.dosage, "Consult physician"),
        route: or_placeholder(&record.route, "As prescribed"),
        confidence: Confidence::from_score(score),
        warnings: SAFETY_WARNINGS.iter().map(|w| (*w).to_string()).collect(),
    }
}

/// Fraction of symptoms mentioned in the record's indication or name.
fn symptom_score(record: &DrugRecord, symptoms: &[String]) -> f64 {
    let indication = record.indication.to_lowercase();
    let name = record.name.to_lowercase();
    let hits = symptoms
        .iter()
        .filter(|s| indication.contains(s.as_str()) || name.contains(s.as_str()))
        .count();
    hits as f64 / symptoms.len() as f64
}

/// Ranks records by how many of the given symptoms they mention.
///
/// Ties keep dataset order. Only the best `top_k` matches are returned.
///
/// # Errors
///
/// Returns `InvalidArgument` when no usable symptom is given and `NotLoaded`
/// when the dataset is unavailable.
pub fn recommend(
    snapshot: &DatasetSnapshot,
    symptoms: &[String],
    additional_info: Option<&str>,
    top_k: usize,
) -> Result<Recommendation, MedDbError> {
    let symptoms = normalize_symptoms(symptoms);
    if symptoms.is_empty() {
        return Err(MedDbError::InvalidArgument("Symptoms are required".into()));
    }
    if !snapshot.is_loaded() {
        return Err(MedDbError::NotLoaded {
            reason: not_loaded_message(snapshot),
        });
    }

    let mut scored: Vec<(f64, &DrugRecord)> = snapshot
        .records()
        .iter()
        .map(|record| (symptom_score(record, &symptoms), record))
        .filter(|(score, _)| *score > 0.0)
        .collect();
    let total_matches = scored.len();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(top_k);

    let medications: Vec<Medication> = scored
        .into_iter()
        .map(|(score, record)| to_medication(record, score))
        .collect();

    Ok(Recommendation {
        total_found: medications.len(),
        total_matches,
        medications,
        symptoms,
        additional_info: additional_info
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        disclaimer: DISCLAIMER,
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    })
}
