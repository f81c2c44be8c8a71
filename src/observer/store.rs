/*!
 * SQLite-backed run history store.
 *
 * Keeps a durable record of every run and every page review, replacing
 * ad-hoc dashboard files. WAL mode, schema-versioned, async access via
 * tokio's spawn_blocking.
 */

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::observer::RunReport;
use crate::validator::Verdict;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "pagesmith.db";

/// Default database directory name under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "pagesmith";

/// A stored run row
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Run identifier
    pub run_id: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Whether the run was a dry run
    pub dry_run: bool,
    /// Projects considered
    pub total_projects: i64,
    /// Drafts generated
    pub drafted: i64,
    /// Approved reviews
    pub approved: i64,
    /// Flagged reviews
    pub flagged: i64,
    /// Rejected reviews
    pub rejected: i64,
    /// Direct pushes
    pub pushed: i64,
    /// Pull requests created
    pub prs_created: i64,
    /// Input tokens consumed
    pub input_tokens: i64,
    /// Output tokens generated
    pub output_tokens: i64,
    /// Run cost in USD
    pub cost_usd: f64,
    /// Whether the run succeeded
    pub success: bool,
}

impl RunRecord {
    /// Build a record from a finalized run report
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            run_id: report.run_id.clone(),
            timestamp: report.timestamp.clone(),
            dry_run: report.dry_run,
            total_projects: report.collected.total as i64,
            drafted: report.drafted as i64,
            approved: report.reviews.approved as i64,
            flagged: report.reviews.flagged as i64,
            rejected: report.reviews.rejected as i64,
            pushed: report.deploys.pushed as i64,
            prs_created: report.deploys.prs_created as i64,
            input_tokens: report.usage.input_tokens as i64,
            output_tokens: report.usage.output_tokens as i64,
            cost_usd: report.cost.total,
            success: report.success(),
        }
    }
}

/// Aggregate statistics across all stored runs
#[derive(Debug, Clone, Default)]
pub struct HistoryStats {
    /// Total runs recorded
    pub total_runs: i64,
    /// Runs that succeeded
    pub successful_runs: i64,
    /// Pages pushed directly, all time
    pub total_pushed: i64,
    /// Pull requests created, all time
    pub total_prs: i64,
    /// Accumulated cost in USD
    pub total_cost_usd: f64,
}

impl std::fmt::Display for HistoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Runs: {} ({} successful), pushed: {}, PRs: {}, cost: ${:.2}",
            self.total_runs,
            self.successful_runs,
            self.total_pushed,
            self.total_prs,
            self.total_cost_usd
        )
    }
}

/// Run history store with thread-safe connection access
#[derive(Clone)]
pub struct RunStore {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl RunStore {
    /// Open the store at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open (or create) the store at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening run history at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory run history");

        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation asynchronously using spawn_blocking
    async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            f(&conn)
        })
        .await
        .context("Database task panicked")?
    }

    /// Record a completed run
    pub async fn record_run(&self, record: &RunRecord) -> Result<()> {
        let record = record.clone();

        self.execute_async(move |conn| {
            conn.execute(
                r#"
                INSERT INTO runs (
                    run_id, timestamp, dry_run, total_projects, drafted,
                    approved, flagged, rejected, pushed, prs_created,
                    input_tokens, output_tokens, cost_usd, success
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    record.run_id,
                    record.timestamp,
                    record.dry_run as i32,
                    record.total_projects,
                    record.drafted,
                    record.approved,
                    record.flagged,
                    record.rejected,
                    record.pushed,
                    record.prs_created,
                    record.input_tokens,
                    record.output_tokens,
                    record.cost_usd,
                    record.success as i32,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Record a page review attached to a run
    pub async fn record_review(
        &self,
        run_id: &str,
        slug: &str,
        verdict: &Verdict,
    ) -> Result<()> {
        let run_id = run_id.to_string();
        let slug = slug.to_string();
        let status = format!("{:?}", verdict.status).to_uppercase();
        let reason = verdict.reason.clone();
        let change_percentage = verdict.change_percentage as i64;
        let issues = serde_json::to_string(&verdict.issues)?;
        let created_at = chrono::Utc::now().to_rfc3339();

        self.execute_async(move |conn| {
            conn.execute(
                r#"
                INSERT INTO page_reviews (
                    run_id, slug, status, reason, change_percentage, issues, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![run_id, slug, status, reason, change_percentage, issues, created_at],
            )?;
            Ok(())
        })
        .await
    }

    /// Get a run by id
    pub async fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let run_id = run_id.to_string();

        self.execute_async(move |conn| {
            let result = conn
                .query_row(
                    r#"
                    SELECT run_id, timestamp, dry_run, total_projects, drafted,
                           approved, flagged, rejected, pushed, prs_created,
                           input_tokens, output_tokens, cost_usd, success
                    FROM runs WHERE run_id = ?1
                    "#,
                    [&run_id],
                    parse_run_row,
                )
                .optional()?;

            Ok(result)
        })
        .await
    }

    /// List the most recent runs, newest first
    pub async fn list_recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        self.execute_async(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT run_id, timestamp, dry_run, total_projects, drafted,
                       approved, flagged, rejected, pushed, prs_created,
                       input_tokens, output_tokens, cost_usd, success
                FROM runs
                ORDER BY timestamp DESC
                LIMIT ?1
                "#,
            )?;

            let runs: Vec<RunRecord> = stmt
                .query_map([limit as i64], parse_run_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(runs)
        })
        .await
    }

    /// Aggregate statistics over all stored runs
    pub async fn stats(&self) -> Result<HistoryStats> {
        self.execute_async(|conn| {
            let stats = conn.query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(success), 0),
                       COALESCE(SUM(pushed), 0),
                       COALESCE(SUM(prs_created), 0),
                       COALESCE(SUM(cost_usd), 0.0)
                FROM runs
                "#,
                [],
                |row| {
                    Ok(HistoryStats {
                        total_runs: row.get(0)?,
                        successful_runs: row.get(1)?,
                        total_pushed: row.get(2)?,
                        total_prs: row.get(3)?,
                        total_cost_usd: row.get(4)?,
                    })
                },
            )?;

            Ok(stats)
        })
        .await
    }

    /// Delete runs older than the specified number of days
    pub async fn delete_old_runs(&self, days: i64) -> Result<i64> {
        self.execute_async(move |conn| {
            let deleted = conn.execute(
                r#"
                DELETE FROM runs
                WHERE timestamp < datetime('now', '-' || ?1 || ' days')
                "#,
                [days],
            )?;
            Ok(deleted as i64)
        })
        .await
    }
}

/// Parse one row of the runs table
fn parse_run_row(row: &rusqlite::Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        run_id: row.get(0)?,
        timestamp: row.get(1)?,
        dry_run: row.get::<_, i32>(2)? != 0,
        total_projects: row.get(3)?,
        drafted: row.get(4)?,
        approved: row.get(5)?,
        flagged: row.get(6)?,
        rejected: row.get(7)?,
        pushed: row.get(8)?,
        prs_created: row.get(9)?,
        input_tokens: row.get(10)?,
        output_tokens: row.get(11)?,
        cost_usd: row.get(12)?,
        success: row.get::<_, i32>(13)? != 0,
    })
}

/// Initialize the database schema
fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing run history schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current_version
        ));
    } else {
        debug!("Run history schema is up to date (v{})", current_version);
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_all_tables(conn: &Connection) -> Result<()> {
    // WAL mode for better concurrency and crash recovery
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            run_id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            dry_run INTEGER NOT NULL DEFAULT 0,
            total_projects INTEGER NOT NULL,
            drafted INTEGER NOT NULL DEFAULT 0,
            approved INTEGER NOT NULL DEFAULT 0,
            flagged INTEGER NOT NULL DEFAULT 0,
            rejected INTEGER NOT NULL DEFAULT 0,
            pushed INTEGER NOT NULL DEFAULT 0,
            prs_created INTEGER NOT NULL DEFAULT 0,
            input_tokens INTEGER NOT NULL DEFAULT 0,
            output_tokens INTEGER NOT NULL DEFAULT 0,
            cost_usd REAL NOT NULL DEFAULT 0.0,
            success INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_runs_timestamp ON runs(timestamp);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS page_reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
            slug TEXT NOT NULL,
            status TEXT NOT NULL,
            reason TEXT NOT NULL,
            change_percentage INTEGER NOT NULL DEFAULT 0,
            issues TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_page_reviews_run ON page_reviews(run_id);
        CREATE INDEX IF NOT EXISTS idx_page_reviews_slug ON page_reviews(slug);
        "#,
    )?;

    info!("Run history schema created successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::VerdictStatus;

    fn record(run_id: &str, success: bool) -> RunRecord {
        RunRecord {
            run_id: run_id.to_string(),
            timestamp: "2025-06-01T00:00:00Z".to_string(),
            dry_run: false,
            total_projects: 3,
            drafted: 2,
            approved: 1,
            flagged: 1,
            rejected: 0,
            pushed: 1,
            prs_created: 1,
            input_tokens: 1000,
            output_tokens: 200,
            cost_usd: 0.006,
            success,
        }
    }

    #[tokio::test]
    async fn test_recordRun_shouldRoundTrip() {
        let store = RunStore::new_in_memory().unwrap();

        store.record_run(&record("run-1", true)).await.unwrap();

        let loaded = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(loaded.run_id, "run-1");
        assert_eq!(loaded.total_projects, 3);
        assert_eq!(loaded.pushed, 1);
        assert!(loaded.success);
    }

    #[tokio::test]
    async fn test_getRun_withUnknownId_shouldReturnNone() {
        let store = RunStore::new_in_memory().unwrap();

        let loaded = store.get_run("missing").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_listRecentRuns_shouldOrderNewestFirst() {
        let store = RunStore::new_in_memory().unwrap();

        let mut old = record("run-old", true);
        old.timestamp = "2025-01-01T00:00:00Z".to_string();
        let mut new = record("run-new", true);
        new.timestamp = "2025-06-01T00:00:00Z".to_string();

        store.record_run(&old).await.unwrap();
        store.record_run(&new).await.unwrap();

        let runs = store.list_recent_runs(10).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, "run-new");
        assert_eq!(runs[1].run_id, "run-old");
    }

    #[tokio::test]
    async fn test_stats_shouldAggregateAcrossRuns() {
        let store = RunStore::new_in_memory().unwrap();

        store.record_run(&record("run-1", true)).await.unwrap();
        store.record_run(&record("run-2", false)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.successful_runs, 1);
        assert_eq!(stats.total_pushed, 2);
        assert_eq!(stats.total_prs, 2);
        assert!((stats.total_cost_usd - 0.012).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_recordReview_shouldAttachToRun() {
        let store = RunStore::new_in_memory().unwrap();
        store.record_run(&record("run-1", true)).await.unwrap();

        let verdict = Verdict {
            status: VerdictStatus::Flagged,
            reason: "Summary near bound".to_string(),
            issues: vec!["issue".to_string()],
            diff_summary: "1 line".to_string(),
            change_percentage: 12,
        };

        store.record_review("run-1", "meld", &verdict).await.unwrap();

        // Verify through a raw count
        let conn = store.connection.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM page_reviews WHERE run_id = 'run-1' AND slug = 'meld'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_deleteOldRuns_shouldDropStaleRows() {
        let store = RunStore::new_in_memory().unwrap();

        let mut ancient = record("run-ancient", true);
        ancient.timestamp = "2001-01-01T00:00:00Z".to_string();
        store.record_run(&ancient).await.unwrap();

        let deleted = store.delete_old_runs(30).await.unwrap();
        assert_eq!(deleted, 1);

        let runs = store.list_recent_runs(10).await.unwrap();
        assert!(runs.is_empty());
    }

    #[test]
    fn test_initializeSchema_calledTwice_shouldBeIdempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).expect("First initialization failed");
        initialize_schema(&conn).expect("Second initialization failed");

        let version = get_schema_version(&conn).expect("Failed to get version");
        assert_eq!(version, SCHEMA_VERSION);
    }
}
