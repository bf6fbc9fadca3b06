use serde::Serialize;

use crate::dataset::{DatasetSnapshot, DrugRecord};
use crate::entities::SearchPage;

/// Hard cap on rows a single search returns, whatever limit the caller asks for.
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Search predicates; `None` or blank imposes no constraint.
///
/// All comparisons are case-insensitive. `query` and `drug_class` match by
/// substring, the remaining filters by whole-value equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugSearchFilters {
    #[serde(rename = "q")]
    pub query: Option<String>,
    pub rx_otc: Option<String>,
    pub pregnancy_category: Option<String>,
    pub csa: Option<String>,
    pub alcohol: Option<String>,
    pub drug_class: Option<String>,
}

fn needle(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Lowercased needles, prepared once per search.
#[derive(Debug)]
struct Matcher {
    query: Option<String>,
    rx_otc: Option<String>,
    pregnancy_category: Option<String>,
    csa: Option<String>,
    alcohol: Option<String>,
    drug_class: Option<String>,
}

impl Matcher {
    fn new(filters: &DrugSearchFilters) -> Self {
        Self {
            query: needle(filters.query.as_deref()),
            rx_otc: needle(filters.rx_otc.as_deref()),
            pregnancy_category: needle(filters.pregnancy_category.as_deref()),
            csa: needle(filters.csa.as_deref()),
            alcohol: needle(filters.alcohol.as_deref()),
            drug_class: needle(filters.drug_class.as_deref()),
        }
    }

    // Predicates run in a fixed order and short-circuit; survivors keep load order.
    fn matches(&self, record: &DrugRecord) -> bool {
        if let Some(q) = &self.query
            && !(contains_casefold(&record.name, q)
                || contains_casefold(&record.indication, q)
                || contains_casefold(&record.side_effects, q))
        {
            return false;
        }
        if let Some(v) = &self.rx_otc
            && !eq_casefold(&record.rx_otc, v)
        {
            return false;
        }
        if let Some(v) = &self.pregnancy_category
            && !eq_casefold(&record.pregnancy_category, v)
        {
            return false;
        }
        if let Some(v) = &self.csa
            && !eq_casefold(&record.csa, v)
        {
            return false;
        }
        if let Some(v) = &self.alcohol
            && !eq_casefold(&record.alcohol, v)
        {
            return false;
        }
        if let Some(v) = &self.drug_class
            && !contains_casefold(&record.drug_class, v)
        {
            return false;
        }
        true
    }
}

fn contains_casefold(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn eq_casefold(value: &str, needle_lower: &str) -> bool {
    value.to_lowercase() == needle_lower
}

/// Yields every matching record in load order. An unloaded snapshot yields nothing.
pub fn search<'a>(
    snapshot: &'a DatasetSnapshot,
    filters: &DrugSearchFilters,
) -> impl Iterator<Item = &'a DrugRecord> + use<'a> {
    let records: &'a [DrugRecord] = if snapshot.is_loaded() {
        snapshot.records()
    } else {
        &[]
    };
    let matcher = Matcher::new(filters);
    records.iter().filter(move |record| matcher.matches(record))
}

/// Returns at most `min(limit, MAX_SEARCH_LIMIT)` matches plus the full match count.
pub fn search_page(
    snapshot: &DatasetSnapshot,
    filters: &DrugSearchFilters,
    limit: usize,
) -> SearchPage<DrugRecord> {
    let cap = limit.min(MAX_SEARCH_LIMIT);
    let mut results = Vec::with_capacity(cap);
    let mut total = 0usize;
    for record in search(snapshot, filters) {
        if results.len() < cap {
            results.push(record.clone());
        }
        total += 1;
    }
    SearchPage::new(results, total)
}

/// One-line description of the active filters, used in rendered output.
pub fn search_query_summary(filters: &DrugSearchFilters) -> String {
    let mut parts: Vec<String> = Vec::new();
    let named = [
        ("", filters.query.as_deref()),
        ("rx_otc", filters.rx_otc.as_deref()),
        ("pregnancy_category", filters.pregnancy_category.as_deref()),
        ("csa", filters.csa.as_deref()),
        ("alcohol", filters.alcohol.as_deref()),
        ("drug_class", filters.drug_class.as_deref()),
    ];
    for (label, value) in named {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        if label.is_empty() {
            parts.push(value.to_string());
        } else {
            parts.push(format!("{label}={value}"));
        }
    }
    if parts.is_empty() {
        "all drugs".to_string()
    } else {
        parts.join(", ")
    }
}
