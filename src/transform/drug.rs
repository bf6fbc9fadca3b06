use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::DrugRecord;

/// Wire shape of a drug row in search responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugSearchResult {
    pub drug_name: String,
    pub indication: String,
    pub side_effects: String,
    pub dosage: String,
    pub route: String,
    pub rx_otc: String,
    pub pregnancy_category: String,
    pub csa: String,
    pub alcohol: String,
    pub drug_class: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl From<DrugRecord> for DrugSearchResult {
    fn from(record: DrugRecord) -> Self {
        Self {
            drug_name: record.name,
            indication: record.indication,
            side_effects: record.side_effects,
            dosage: record.dosage,
            route: record.route,
            rx_otc: record.rx_otc,
            pregnancy_category: record.pregnancy_category,
            csa: record.csa,
            alcohol: record.alcohol,
            drug_class: record.drug_class,
            extra: record.extra,
        }
    }
}

pub(crate) fn to_search_results(records: Vec<DrugRecord>) -> Vec<DrugSearchResult> {
    records.into_iter().map(DrugSearchResult::from).collect()
}
