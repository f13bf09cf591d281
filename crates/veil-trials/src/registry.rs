//! Append-only registry of sweep results with CSV and SQLite backends.

use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use veil_core::errors::{ErrorInfo, VeilError};

use crate::record::wrap_csv;
use crate::sweep::SweepReport;

/// Supported registry backends.
#[derive(Debug, Clone, PartialEq)]
pub enum Registry {
    /// Flat CSV file.
    Csv(PathBuf),
    /// SQLite database.
    Sqlite(PathBuf),
}

impl Registry {
    /// Construct a registry handle from a filesystem path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sqlite") | Some("db") => Registry::Sqlite(path),
            _ => Registry::Csv(path),
        }
    }
}

/// Query descriptor for registry lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Query {
    /// Restrict rows to a single shape label.
    #[serde(default)]
    pub shape: Option<String>,
    /// Maximum number of rows returned.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Table representation returned from registry queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in row order.
    pub columns: Vec<String>,
    /// Row cells as strings.
    pub rows: Vec<Vec<String>>,
}

fn table_columns() -> Vec<String> {
    let mut columns = vec![
        "created_at".to_string(),
        "plan_hash".to_string(),
        "shape".to_string(),
        "repeat".to_string(),
    ];
    columns.extend(crate::record::record_columns());
    columns
}

fn empty_table() -> Table {
    Table {
        columns: table_columns(),
        rows: Vec::new(),
    }
}

fn report_rows(report: &SweepReport) -> Vec<Vec<String>> {
    report
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                report.created_at.clone(),
                report.plan_hash.clone(),
                row.shape.label(),
                row.repeat.to_string(),
            ];
            cells.extend(row.record.to_cells());
            cells
        })
        .collect()
}

/// Appends every row of `report` to the registry backend.
pub fn registry_append(registry: &Registry, report: &SweepReport) -> Result<(), VeilError> {
    match registry {
        Registry::Csv(path) => append_csv(path, report),
        Registry::Sqlite(path) => append_sqlite(path, report),
    }
}

/// Queries the registry returning a structured table.
pub fn registry_query(registry: &Registry, query: &Query) -> Result<Table, VeilError> {
    match registry {
        Registry::Csv(path) => query_csv(path, query),
        Registry::Sqlite(path) => query_sqlite(path, query),
    }
}

fn ensure_parent(path: &Path) -> Result<(), VeilError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                VeilError::Serde(
                    ErrorInfo::new("registry-create", "failed to create registry directory")
                        .with_context("path", parent.display().to_string())
                        .with_context("cause", err.to_string()),
                )
            })?;
        }
    }
    Ok(())
}

fn append_csv(path: &Path, report: &SweepReport) -> Result<(), VeilError> {
    ensure_parent(path)?;
    let file_exists = path.exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| {
            VeilError::Serde(
                ErrorInfo::new("registry-open", "failed to open CSV registry")
                    .with_context("path", path.display().to_string())
                    .with_context("cause", err.to_string()),
            )
        })?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    if !file_exists {
        writer
            .write_record(table_columns())
            .map_err(|err| wrap_csv("registry-write-header", err))?;
    }
    for cells in report_rows(report) {
        writer
            .write_record(&cells)
            .map_err(|err| wrap_csv("registry-write-row", err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_csv("registry-flush", err.into()))?;
    Ok(())
}

fn sqlite_error(code: &str, err: impl ToString) -> VeilError {
    VeilError::Serde(
        ErrorInfo::new(code, "sqlite registry failure").with_context("cause", err.to_string()),
    )
}

fn append_sqlite(path: &Path, report: &SweepReport) -> Result<(), VeilError> {
    ensure_parent(path)?;
    let mut conn =
        Connection::open(path).map_err(|err| sqlite_error("registry-sqlite-open", err))?;
    conn.execute_batch(
        r#"CREATE TABLE IF NOT EXISTS trials (
            created_at TEXT NOT NULL,
            plan_hash TEXT NOT NULL,
            shape TEXT NOT NULL,
            repeat INTEGER NOT NULL,
            epsilon REAL NOT NULL,
            robust_cost REAL NOT NULL,
            nominal_cost REAL NOT NULL,
            ideal_cost REAL,
            radius_multiplier REAL NOT NULL,
            estimated_radius REAL,
            applied_radius REAL NOT NULL,
            true_radius REAL NOT NULL,
            perturbed_workload TEXT NOT NULL,
            true_workload TEXT NOT NULL
        );"#,
    )
    .map_err(|err| sqlite_error("registry-sqlite-schema", err))?;
    let tx = conn
        .transaction()
        .map_err(|err| sqlite_error("registry-sqlite-transaction", err))?;
    for row in &report.rows {
        let record = &row.record;
        tx.execute(
            r#"INSERT INTO trials (
                created_at, plan_hash, shape, repeat, epsilon, robust_cost,
                nominal_cost, ideal_cost, radius_multiplier, estimated_radius,
                applied_radius, true_radius, perturbed_workload, true_workload
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"#,
            params![
                &report.created_at,
                &report.plan_hash,
                row.shape.label(),
                row.repeat as i64,
                record.epsilon,
                record.robust_cost,
                record.nominal_cost,
                record.ideal_cost,
                record.radius_multiplier,
                record.estimated_radius,
                record.applied_radius,
                record.true_radius,
                record.perturbed_workload.to_string(),
                record.true_workload.to_string(),
            ],
        )
        .map_err(|err| sqlite_error("registry-sqlite-insert", err))?;
    }
    tx.commit()
        .map_err(|err| sqlite_error("registry-sqlite-commit", err))?;
    Ok(())
}

fn query_csv(path: &Path, query: &Query) -> Result<Table, VeilError> {
    if !path.exists() {
        return Ok(empty_table());
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| wrap_csv("registry-read", err))?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| wrap_csv("registry-record", err))?;
        if let Some(shape) = &query.shape {
            if record.get(2) != Some(shape.as_str()) {
                continue;
            }
        }
        rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        if let Some(limit) = query.limit {
            if rows.len() >= limit {
                break;
            }
        }
    }
    Ok(Table {
        columns: table_columns(),
        rows,
    })
}

fn query_sqlite(path: &Path, query: &Query) -> Result<Table, VeilError> {
    if !path.exists() {
        return Ok(empty_table());
    }
    let conn = Connection::open(path).map_err(|err| sqlite_error("registry-sqlite-open", err))?;
    let mut sql = "SELECT created_at, plan_hash, shape, repeat, epsilon, robust_cost, \
                   nominal_cost, ideal_cost, radius_multiplier, estimated_radius, \
                   applied_radius, true_radius, perturbed_workload, true_workload FROM trials"
        .to_string();
    if query.shape.is_some() {
        sql.push_str(" WHERE shape = ?1");
    }
    sql.push_str(" ORDER BY created_at, shape, repeat");
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|err| sqlite_error("registry-sqlite-prepare", err))?;
    let mut rows_iter = if let Some(shape) = &query.shape {
        stmt.query([shape])
    } else {
        stmt.query([])
    }
    .map_err(|err| sqlite_error("registry-sqlite-query", err))?;

    let mut rows = Vec::new();
    while let Some(row) = rows_iter
        .next()
        .map_err(|err| sqlite_error("registry-sqlite-row", err))?
    {
        let mut cells = Vec::with_capacity(14);
        cells.push(read_text(row, 0)?);
        cells.push(read_text(row, 1)?);
        cells.push(read_text(row, 2)?);
        cells.push(
            row.get::<_, i64>(3)
                .map_err(|err| sqlite_error("registry-sqlite-get", err))?
                .to_string(),
        );
        for idx in 4..12 {
            let value: Option<f64> = row
                .get(idx)
                .map_err(|err| sqlite_error("registry-sqlite-get", err))?;
            cells.push(value.map(|v| v.to_string()).unwrap_or_default());
        }
        cells.push(read_text(row, 12)?);
        cells.push(read_text(row, 13)?);
        rows.push(cells);
    }
    Ok(Table {
        columns: table_columns(),
        rows,
    })
}

fn read_text(row: &rusqlite::Row<'_>, idx: usize) -> Result<String, VeilError> {
    row.get::<_, String>(idx)
        .map_err(|err| sqlite_error("registry-sqlite-get", err))
}
