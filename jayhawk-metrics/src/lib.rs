//! Labor-hours metric for Jayhawk
//!
//! Estimates the effort that went into a repository from its analysed code:
//! per repository and language, `avg(code_complexity) * sum(code_lines) + 20`,
//! dated by the latest analysis truncated to a reporting period and summed
//! per repository and period.

pub mod error;
pub mod labor;
pub mod period;
pub mod query;
pub mod store;

pub use error::{MetricsError, MetricsResult};
pub use labor::{
    aggregate_labor_hours, language_breakdown, LaborHoursRow, LaborRecord, LanguageLabor,
    LABOR_HOURS_BASELINE,
};
pub use period::Period;
pub use query::{parse_datetime, LaborHoursQuery, ResolvedQuery, DEFAULT_BEGIN_DATE};
pub use store::{compute_labor_hours, LaborDataSource, SqliteLaborStore};
