use std::collections::BTreeMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};

/// One row of the drug dataset with its canonical fields resolved.
///
/// Canonical fields are always present; a column missing from the source
/// file yields an empty string. Columns not consumed by a canonical field
/// land in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrugRecord {
    pub name: String,
    pub indication: String,
    pub side_effects: String,
    pub dosage: String,
    pub route: String,
    pub rx_otc: String,
    pub pregnancy_category: String,
    pub csa: String,
    pub alcohol: String,
    pub drug_class: String,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CanonicalField {
    Name,
    Indication,
    SideEffects,
    Dosage,
    Route,
    RxOtc,
    PregnancyCategory,
    Csa,
    Alcohol,
    DrugClass,
}

impl CanonicalField {
    pub(crate) const ALL: [CanonicalField; 10] = [
        CanonicalField::Name,
        CanonicalField::Indication,
        CanonicalField::SideEffects,
        CanonicalField::Dosage,
        CanonicalField::Route,
        CanonicalField::RxOtc,
        CanonicalField::PregnancyCategory,
        CanonicalField::Csa,
        CanonicalField::Alcohol,
        CanonicalField::DrugClass,
    ];

    /// Source header spellings, checked in order.
    fn column_probes(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Name => &["drug_name", "Drug Name", "name"],
            CanonicalField::Indication => &["indication", "Indication", "medical_condition"],
            CanonicalField::SideEffects => &["side_effects", "Side Effects"],
            CanonicalField::Dosage => &["dosage", "Dosage"],
            CanonicalField::Route => &["route", "Route"],
            CanonicalField::RxOtc => &["rx_otc", "Rx/OTC", "Rx OTC"],
            CanonicalField::PregnancyCategory => &["pregnancy_category", "Pregnancy Category"],
            CanonicalField::Csa => &["csa", "CSA"],
            CanonicalField::Alcohol => &["alcohol", "Alcohol"],
            CanonicalField::DrugClass => &["drug_class", "Drug Class", "drug_classes"],
        }
    }

    fn slot(self, record: &mut DrugRecord) -> &mut String {
        match self {
            CanonicalField::Name => &mut record.name,
            CanonicalField::Indication => &mut record.indication,
            CanonicalField::SideEffects => &mut record.side_effects,
            CanonicalField::Dosage => &mut record.dosage,
            CanonicalField::Route => &mut record.route,
            CanonicalField::RxOtc => &mut record.rx_otc,
            CanonicalField::PregnancyCategory => &mut record.pregnancy_category,
            CanonicalField::Csa => &mut record.csa,
            CanonicalField::Alcohol => &mut record.alcohol,
            CanonicalField::DrugClass => &mut record.drug_class,
        }
    }
}

/// Header positions resolved once per file.
#[derive(Debug)]
struct ColumnMap {
    canonical: Vec<(CanonicalField, usize)>,
    extra: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let mut consumed = vec![false; names.len()];
        let mut canonical = Vec::with_capacity(CanonicalField::ALL.len());

        for field in CanonicalField::ALL {
            let hit = field
                .column_probes()
                .iter()
                .find_map(|probe| names.iter().position(|name| name == probe));
            if let Some(idx) = hit {
                consumed[idx] = true;
                canonical.push((field, idx));
            }
        }

        // Probes match on trimmed names; `extra` keeps the header as written.
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(idx, raw)| !consumed[*idx] && !raw.trim().is_empty())
            .map(|(idx, raw)| (raw.to_string(), idx))
            .collect();

        Self { canonical, extra }
    }

    fn build(&self, row: &StringRecord) -> DrugRecord {
        let mut record = DrugRecord::default();
        for (field, idx) in &self.canonical {
            if let Some(value) = row.get(*idx) {
                *field.slot(&mut record) = value.to_string();
            }
        }
        for (name, idx) in &self.extra {
            if let Some(value) = row.get(*idx) {
                record.extra.insert(name.clone(), value.to_string());
            }
        }
        record
    }
}

/// Parses a headed CSV stream into records.
///
/// Any malformed row (wrong field count, invalid UTF-8) fails the whole parse.
pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<DrugRecord>, csv::Error> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns = ColumnMap::from_headers(rdr.headers()?);

    let mut out = Vec::new();
    for row in rdr.records() {
        out.push(columns.build(&row?));
    }
    Ok(out)
}
