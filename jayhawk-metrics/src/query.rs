//! Labor-hours query parameters

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, MetricsResult};
use crate::period::Period;

/// Lower bound used when a query names no begin date
pub const DEFAULT_BEGIN_DATE: &str = "1970-01-01 00:00:01";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a timestamp as `YYYY-MM-DD HH:MM:SS`, its `T`-separated form, or a
/// bare date (midnight).
pub fn parse_datetime(value: &str) -> MetricsResult<NaiveDateTime> {
    let value = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| MetricsError::InvalidQuery(format!("Invalid timestamp: '{}'", value)))
}

/// Request for labor-hour rows. Unset dates are filled in by
/// [`resolve`](Self::resolve).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborHoursQuery {
    pub repo_group_id: i64,

    /// Restrict to one repository; every repository in the group when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<i64>,

    #[serde(default, with = "flexible_datetime", skip_serializing_if = "Option::is_none")]
    pub begin_date: Option<NaiveDateTime>,

    #[serde(default, with = "flexible_datetime", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,

    #[serde(default)]
    pub period: Period,
}

/// Query with every default applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub repo_group_id: i64,
    pub repo_id: Option<i64>,
    pub begin_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub period: Period,
}

impl LaborHoursQuery {
    pub fn for_group(repo_group_id: i64) -> Self {
        Self {
            repo_group_id,
            repo_id: None,
            begin_date: None,
            end_date: None,
            period: Period::default(),
        }
    }

    pub fn for_repo(repo_group_id: i64, repo_id: i64) -> Self {
        Self {
            repo_id: Some(repo_id),
            ..Self::for_group(repo_group_id)
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn between(mut self, begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.begin_date = Some(begin);
        self.end_date = Some(end);
        self
    }

    /// Fill in defaults: begin at [`DEFAULT_BEGIN_DATE`], end at `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> MetricsResult<ResolvedQuery> {
        let begin_date = match self.begin_date {
            Some(begin) => begin,
            None => parse_datetime(DEFAULT_BEGIN_DATE)?,
        };
        let end_date = self.end_date.unwrap_or(now);

        if begin_date > end_date {
            return Err(MetricsError::InvalidQuery(format!(
                "begin_date {} is after end_date {}",
                begin_date, end_date
            )));
        }

        Ok(ResolvedQuery {
            repo_group_id: self.repo_group_id,
            repo_id: self.repo_id,
            begin_date,
            end_date,
            period: self.period,
        })
    }

    /// Command-line form understood by the `compute` subcommand
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--repo-group-id".to_string(),
            self.repo_group_id.to_string(),
            "--period".to_string(),
            self.period.to_string(),
        ];

        if let Some(repo_id) = self.repo_id {
            args.push("--repo-id".to_string());
            args.push(repo_id.to_string());
        }
        if let Some(begin) = self.begin_date {
            args.push("--begin-date".to_string());
            args.push(begin.format(DATETIME_FORMATS[0]).to_string());
        }
        if let Some(end) = self.end_date {
            args.push("--end-date".to_string());
            args.push(end.format(DATETIME_FORMATS[0]).to_string());
        }

        args
    }
}

impl ResolvedQuery {
    /// Inclusive on both ends
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.begin_date <= timestamp && timestamp <= self.end_date
    }
}

mod flexible_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_datetime(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
