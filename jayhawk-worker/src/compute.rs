//! The `compute` subcommand: the body of the computation child

use chrono::Local;
use jayhawk_config::DatabaseConfig;
use jayhawk_metrics::{compute_labor_hours, LaborHoursQuery, LaborHoursRow, SqliteLaborStore};
use std::io::Write;
use tracing::info;

use crate::error::RuntimeResult;

/// Run one labor-hours query against the configured database
pub async fn run_computation(
    database: &DatabaseConfig,
    query: &LaborHoursQuery,
    init_schema: bool,
) -> RuntimeResult<Vec<LaborHoursRow>> {
    let store = SqliteLaborStore::connect(database).await?;
    if init_schema {
        store.create_schema().await?;
    }

    let rows = compute_labor_hours(&store, query, Local::now().naive_local()).await?;
    info!(
        repo_group_id = query.repo_group_id,
        repo_id = ?query.repo_id,
        period = %query.period,
        "Labor hours computed: {} rows",
        rows.len()
    );
    Ok(rows)
}

/// Write rows as a JSON array followed by a newline
pub fn write_rows(out: &mut impl Write, rows: &[LaborHoursRow], pretty: bool) -> std::io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, rows)?;
    } else {
        serde_json::to_writer(&mut *out, rows)?;
    }
    writeln!(out)?;
    out.flush()
}
