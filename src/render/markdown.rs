use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::api::types::SearchResponse;
use crate::entities::recommend::Recommendation;
use crate::entities::stats::StatsReport;
use crate::error::MedDbError;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(serde::Serialize)]
struct CountRow<'a> {
    value: &'a str,
    count: usize,
}

#[derive(serde::Serialize)]
struct CountSection<'a> {
    title: &'static str,
    rows: Vec<CountRow<'a>>,
}

fn env() -> Result<&'static Environment<'static>, MedDbError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.add_filter("truncate", |s: String, max_bytes: usize| -> String {
        if s.len() <= max_bytes {
            return s;
        }
        if max_bytes == 0 {
            return "…".to_string();
        }
        let mut boundary = max_bytes;
        while boundary > 0 && !s.is_char_boundary(boundary) {
            boundary -= 1;
        }
        let mut out = s[..boundary].trim_end().to_string();
        out.push('…');
        out
    });
    env.add_filter("cell", |s: String| -> String {
        let flat = s.replace(['\r', '\n'], " ").replace('|', "\\|");
        let flat = flat.trim();
        if flat.is_empty() {
            "-".to_string()
        } else {
            flat.to_string()
        }
    });
    env.add_filter("score", |v: f64| -> String { format!("{v:.2}") });
    env.add_template(
        "drug_search.md.j2",
        include_str!("../../templates/drug_search.md.j2"),
    )?;
    env.add_template(
        "drug_stats.md.j2",
        include_str!("../../templates/drug_stats.md.j2"),
    )?;
    env.add_template(
        "recommend.md.j2",
        include_str!("../../templates/recommend.md.j2"),
    )?;

    let _ = ENV.set(env);
    Ok(ENV
        .get()
        .expect("ENV should be initialized by the time this is reached"))
}

fn search_footer(showing: usize, total: usize) -> String {
    if total == 0 {
        return String::new();
    }
    if showing < total {
        format!("Showing {showing} of {total} results. Use --limit to see more (max 50).")
    } else {
        format!("Showing {showing} of {total} results.")
    }
}

fn with_footer(mut body: String, footer: &str) -> String {
    let footer = footer.trim();
    if footer.is_empty() {
        return body;
    }
    if !body.ends_with('\n') {
        body.push('\n');
    }
    body.push('\n');
    body.push_str(footer);
    body.push('\n');
    body
}

pub fn drug_search_markdown(query: &str, response: &SearchResponse) -> Result<String, MedDbError> {
    let tmpl = env()?.get_template("drug_search.md.j2")?;
    let loaded = response.database_status == "loaded";
    let body = tmpl.render(context! {
        query => query,
        loaded => loaded,
        database_status => response.database_status,
        results => &response.results,
    })?;
    Ok(with_footer(
        body,
        &search_footer(response.showing, response.total),
    ))
}

pub fn stats_markdown(report: &StatsReport) -> Result<String, MedDbError> {
    fn rows(dist: &std::collections::BTreeMap<String, usize>) -> Vec<CountRow<'_>> {
        let mut rows: Vec<CountRow<'_>> = dist
            .iter()
            .map(|(value, count)| CountRow {
                value: value.as_str(),
                count: *count,
            })
            .collect();
        // Most frequent first; BTreeMap order breaks ties alphabetically.
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows
    }

    let sections = vec![
        CountSection {
            title: "Rx/OTC",
            rows: rows(&report.rx_otc_distribution),
        },
        CountSection {
            title: "Pregnancy Categories",
            rows: rows(&report.pregnancy_categories),
        },
        CountSection {
            title: "Drug Classes",
            rows: rows(&report.drug_classes),
        },
    ];

    let tmpl = env()?.get_template("drug_stats.md.j2")?;
    Ok(tmpl.render(context! {
        total_drugs => report.total_drugs,
        sampled => report.sampled,
        sections => sections,
    })?)
}

pub fn recommend_markdown(rec: &Recommendation) -> Result<String, MedDbError> {
    let tmpl = env()?.get_template("recommend.md.j2")?;
    Ok(tmpl.render(context! {
        symptoms => &rec.symptoms,
        additional_info => &rec.additional_info,
        medications => &rec.medications,
        total_found => rec.total_found,
        total_matches => rec.total_matches,
        disclaimer => rec.disclaimer,
    })?)
}
