//! Lenient request parameter coercion.
//!
//! Inbound parameters are untyped: query strings, JSON bodies with numbers
//! where strings were expected, arrays from repeated form fields. Everything
//! is flattened to `key -> String` here and nothing in this module fails;
//! unusable input is dropped and callers fall back to defaults.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::entities::drug::{DEFAULT_SEARCH_LIMIT, DrugSearchFilters};
use crate::entities::recommend::{normalize_symptoms, split_symptoms};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: BTreeMap<String, String>,
}

impl RequestParams {
    /// First occurrence of a repeated key wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut values = BTreeMap::new();
        for (key, value) in pairs {
            values.entry(key).or_insert(value);
        }
        Self { values }
    }

    /// Non-object or malformed bodies yield no parameters.
    pub fn from_json_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        let values = map
            .iter()
            .filter_map(|(key, value)| coerce_scalar(value).map(|v| (key.clone(), v)))
            .collect();
        Self { values }
    }

    /// Entries from `other` override entries already present.
    pub fn merged(mut self, other: RequestParams) -> Self {
        self.values.extend(other.values);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Looks up the first present key among camelCase/snake_case spellings.
    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.get(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn search_filters(&self) -> DrugSearchFilters {
        DrugSearchFilters {
            query: self.first_of(&["q", "query"]),
            rx_otc: self.first_of(&["rxOtc", "rx_otc"]),
            pregnancy_category: self.first_of(&["pregnancyCategory", "pregnancy_category"]),
            csa: self.first_of(&["csa"]),
            alcohol: self.first_of(&["alcohol"]),
            drug_class: self.first_of(&["drugClass", "drug_class"]),
        }
    }

    pub fn limit(&self) -> usize {
        parse_limit(self.get("limit"))
    }
}

/// Stringifies scalars; arrays contribute their first scalar element.
pub(crate) fn coerce_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.iter().find_map(coerce_scalar),
        Value::Null | Value::Object(_) => None,
    }
}

/// Parses the leading integer of `raw` (`"15abc"` is 15).
///
/// Missing, unparseable, zero or negative values yield the default limit.
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw.map(str::trim) else {
        return DEFAULT_SEARCH_LIMIT;
    };
    let digits: String = raw
        .strip_prefix('+')
        .unwrap_or(raw)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => DEFAULT_SEARCH_LIMIT,
    }
}

/// Pulls the symptom list out of a recommendation body.
///
/// Accepts a JSON array of terms or one delimited string.
pub fn symptoms_from_json(body: &Value) -> Vec<String> {
    match body.get("symptoms") {
        Some(Value::Array(items)) => {
            normalize_symptoms(items.iter().filter_map(coerce_scalar))
        }
        Some(Value::String(text)) => split_symptoms(text),
        _ => Vec::new(),
    }
}

pub fn additional_info_from_json(body: &Value) -> Option<String> {
    ["additional_info", "additionalInfo"]
        .iter()
        .find_map(|key| body.get(*key))
        .and_then(coerce_scalar)
}

/// Normalized echo of the search input returned alongside results.
#[derive(Debug, Clone, Serialize)]
pub struct QueryEcho {
    #[serde(flatten)]
    pub filters: DrugSearchFilters,
    pub limit: usize,
}
