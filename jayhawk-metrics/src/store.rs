//! Labor data sources

use chrono::NaiveDateTime;
use jayhawk_config::DatabaseConfig;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::MetricsResult;
use crate::labor::{aggregate_labor_hours, LaborHoursRow, LaborRecord};
use crate::query::{LaborHoursQuery, ResolvedQuery};

/// Source of raw labor samples
#[async_trait::async_trait]
pub trait LaborDataSource: Send + Sync {
    /// Samples for the query's repository, or for every repository in its
    /// group, analysed within the query's date range
    async fn labor_records(&self, query: &ResolvedQuery) -> MetricsResult<Vec<LaborRecord>>;
}

/// Resolve `query` against `now`, fetch its samples and aggregate them
pub async fn compute_labor_hours(
    source: &dyn LaborDataSource,
    query: &LaborHoursQuery,
    now: NaiveDateTime,
) -> MetricsResult<Vec<LaborHoursRow>> {
    let resolved = query.resolve(now)?;
    debug!(
        repo_group_id = resolved.repo_group_id,
        repo_id = ?resolved.repo_id,
        period = %resolved.period,
        "Computing labor hours from {} to {}",
        resolved.begin_date,
        resolved.end_date
    );

    let records = source.labor_records(&resolved).await?;
    let rows = aggregate_labor_hours(&records, resolved.period);

    info!(
        "Computed {} labor-hour rows from {} samples",
        rows.len(),
        records.len()
    );
    Ok(rows)
}

const SELECT_LABOR: &str = r#"
    SELECT
        repo_labor.repo_id,
        repo.repo_name,
        repo_groups.rg_name,
        repo_labor.programming_language,
        repo_labor.rl_analysis_date,
        repo_labor.total_lines,
        repo_labor.code_lines,
        repo_labor.comment_lines,
        repo_labor.blank_lines,
        repo_labor.code_complexity
    FROM repo_labor
    JOIN repo ON repo.repo_id = repo_labor.repo_id
    JOIN repo_groups ON repo_groups.repo_group_id = repo.repo_group_id
"#;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS repo_groups (
        repo_group_id INTEGER PRIMARY KEY,
        rg_name TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS repo (
        repo_id INTEGER PRIMARY KEY,
        repo_group_id INTEGER NOT NULL REFERENCES repo_groups (repo_group_id),
        repo_name TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS repo_labor (
        repo_labor_id INTEGER PRIMARY KEY AUTOINCREMENT,
        repo_id INTEGER NOT NULL REFERENCES repo (repo_id),
        rl_analysis_date TEXT NOT NULL,
        programming_language TEXT NOT NULL,
        total_lines INTEGER NOT NULL DEFAULT 0,
        code_lines INTEGER NOT NULL DEFAULT 0,
        comment_lines INTEGER NOT NULL DEFAULT 0,
        blank_lines INTEGER NOT NULL DEFAULT 0,
        code_complexity REAL NOT NULL DEFAULT 0
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_repo_labor_repo ON repo_labor (repo_id)",
];

/// SQLite-backed labor store
#[derive(Debug, Clone)]
pub struct SqliteLaborStore {
    pool: SqlitePool,
}

impl SqliteLaborStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> MetricsResult<Self> {
        info!("Connecting to metrics database: {}", config.url);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout)
            .connect(&config.url)
            .await?;

        debug!(
            "Metrics database connected with {} max connections",
            config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the labor tables if they do not exist
    pub async fn create_schema(&self) -> MetricsResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Labor schema ready");
        Ok(())
    }

    pub async fn insert_repo_group(&self, repo_group_id: i64, rg_name: &str) -> MetricsResult<()> {
        sqlx::query("INSERT INTO repo_groups (repo_group_id, rg_name) VALUES (?, ?)")
            .bind(repo_group_id)
            .bind(rg_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_repo(
        &self,
        repo_id: i64,
        repo_group_id: i64,
        repo_name: &str,
    ) -> MetricsResult<()> {
        sqlx::query("INSERT INTO repo (repo_id, repo_group_id, repo_name) VALUES (?, ?, ?)")
            .bind(repo_id)
            .bind(repo_group_id)
            .bind(repo_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store one analysis sample. Repository and group names come from
    /// their own tables, so those fields of `record` are ignored.
    pub async fn insert_labor(&self, record: &LaborRecord) -> MetricsResult<()> {
        sqlx::query(
            r#"INSERT INTO repo_labor (
                repo_id, rl_analysis_date, programming_language,
                total_lines, code_lines, comment_lines, blank_lines, code_complexity
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.repo_id)
        .bind(record.rl_analysis_date)
        .bind(&record.programming_language)
        .bind(record.total_lines)
        .bind(record.code_lines)
        .bind(record.comment_lines)
        .bind(record.blank_lines)
        .bind(record.code_complexity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn map_row(row: &SqliteRow) -> Result<LaborRecord, sqlx::Error> {
        Ok(LaborRecord {
            repo_id: row.try_get("repo_id")?,
            repo_name: row.try_get("repo_name")?,
            rg_name: row.try_get("rg_name")?,
            programming_language: row.try_get("programming_language")?,
            rl_analysis_date: row.try_get("rl_analysis_date")?,
            total_lines: row.try_get("total_lines")?,
            code_lines: row.try_get("code_lines")?,
            comment_lines: row.try_get("comment_lines")?,
            blank_lines: row.try_get("blank_lines")?,
            code_complexity: row.try_get("code_complexity")?,
        })
    }
}

#[async_trait::async_trait]
impl LaborDataSource for SqliteLaborStore {
    async fn labor_records(&self, query: &ResolvedQuery) -> MetricsResult<Vec<LaborRecord>> {
        let rows = match query.repo_id {
            Some(repo_id) => {
                let sql = format!("{} WHERE repo.repo_id = ?", SELECT_LABOR);
                sqlx::query(&sql).bind(repo_id).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!("{} WHERE repo.repo_group_id = ?", SELECT_LABOR);
                sqlx::query(&sql)
                    .bind(query.repo_group_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let fetched = rows.len();
        let mut records = Vec::with_capacity(fetched);
        for row in &rows {
            let record = Self::map_row(row)?;
            if query.contains(record.rl_analysis_date) {
                records.push(record);
            }
        }

        debug!(
            "Fetched {} labor samples, {} within range",
            fetched,
            records.len()
        );
        Ok(records)
    }
}
