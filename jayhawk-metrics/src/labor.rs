//! Labor-hours aggregation

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::period::Period;

/// Hours added to every repository/language estimate
pub const LABOR_HOURS_BASELINE: f64 = 20.0;

/// One analysed (repository, language) sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborRecord {
    pub repo_id: i64,
    pub repo_name: String,
    pub rg_name: String,
    pub programming_language: String,
    pub rl_analysis_date: NaiveDateTime,
    pub total_lines: i64,
    pub code_lines: i64,
    pub comment_lines: i64,
    pub blank_lines: i64,
    pub code_complexity: f64,
}

/// Per repository and language totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageLabor {
    pub date: NaiveDate,
    pub repo_id: i64,
    pub repo_name: String,
    pub rg_name: String,
    pub programming_language: String,
    pub analysis_date: NaiveDateTime,
    pub total_lines: i64,
    pub code_lines: i64,
    pub comment_lines: i64,
    pub blank_lines: i64,
    pub avg_code_complexity: f64,
    pub estimated_labor_hours: f64,
}

/// Output row: estimated hours for one repository in one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborHoursRow {
    pub date: NaiveDate,
    pub repo_id: i64,
    pub repo_name: String,
    pub group_name: String,
    pub estimated_hours: f64,
}

#[derive(Default)]
struct LanguageAccumulator {
    latest: Option<NaiveDateTime>,
    samples: usize,
    complexity_sum: f64,
    total_lines: i64,
    code_lines: i64,
    comment_lines: i64,
    blank_lines: i64,
}

/// Group samples by repository and language. Each group is dated by its
/// latest analysis truncated to `period`.
pub fn language_breakdown(records: &[LaborRecord], period: Period) -> Vec<LanguageLabor> {
    let mut groups: BTreeMap<(&str, i64, &str, &str), LanguageAccumulator> = BTreeMap::new();

    for record in records {
        let key = (
            record.repo_name.as_str(),
            record.repo_id,
            record.programming_language.as_str(),
            record.rg_name.as_str(),
        );
        let acc = groups.entry(key).or_default();

        acc.latest = Some(match acc.latest {
            Some(latest) if latest >= record.rl_analysis_date => latest,
            _ => record.rl_analysis_date,
        });
        acc.samples += 1;
        acc.complexity_sum += record.code_complexity;
        acc.total_lines += record.total_lines;
        acc.code_lines += record.code_lines;
        acc.comment_lines += record.comment_lines;
        acc.blank_lines += record.blank_lines;
    }

    groups
        .into_iter()
        .filter_map(|((repo_name, repo_id, language, rg_name), acc)| {
            let analysis_date = acc.latest?;
            let avg_code_complexity = acc.complexity_sum / acc.samples as f64;

            Some(LanguageLabor {
                date: period.truncate(analysis_date),
                repo_id,
                repo_name: repo_name.to_string(),
                rg_name: rg_name.to_string(),
                programming_language: language.to_string(),
                analysis_date,
                total_lines: acc.total_lines,
                code_lines: acc.code_lines,
                comment_lines: acc.comment_lines,
                blank_lines: acc.blank_lines,
                avg_code_complexity,
                estimated_labor_hours: avg_code_complexity * acc.code_lines as f64
                    + LABOR_HOURS_BASELINE,
            })
        })
        .collect()
}

/// Sum the per-language estimates per repository and period, rounded to two
/// decimals and ordered by repository name.
pub fn aggregate_labor_hours(records: &[LaborRecord], period: Period) -> Vec<LaborHoursRow> {
    let mut totals: BTreeMap<(String, NaiveDate, i64, String), f64> = BTreeMap::new();

    for language in language_breakdown(records, period) {
        *totals
            .entry((
                language.repo_name,
                language.date,
                language.repo_id,
                language.rg_name,
            ))
            .or_default() += language.estimated_labor_hours;
    }

    totals
        .into_iter()
        .map(|((repo_name, date, repo_id, group_name), hours)| LaborHoursRow {
            date,
            repo_id,
            repo_name,
            group_name,
            estimated_hours: round_hours(hours),
        })
        .collect()
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
