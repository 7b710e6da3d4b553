use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::evaluation::{EvaluationReport, SegmentationScores};

pub const LEDGER_SCHEMA_VERSION: &str = "1";
pub const DEFAULT_LEDGER_FILE: &str = "experiments.sqlite";

/// One evaluated experiment as listed by `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSummary {
    pub experiment_id: String,
    pub name: String,
    pub directory: String,
    pub families: String,
    pub folds: i64,
    pub combined: bool,
    pub evaluated_at: DateTime<Utc>,
    pub mean_window_diff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredScores {
    pub fold: i64,
    pub system: String,
    pub scores: SegmentationScores,
}

/// Identity of an evaluation run written to the ledger.
#[derive(Debug, Clone)]
pub struct ExperimentRecord<'a> {
    pub experiment_id: &'a str,
    pub directory: &'a Path,
    pub families: &'a str,
    pub evaluated_at: DateTime<Utc>,
}

/// SQLite ledger of evaluated experiments and their per-fold scores.
pub struct ExperimentStore {
    connection: Connection,
}

impl ExperimentStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            crate::util::ensure_directory(parent)?;
        }
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory ledger")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Replaces any previous record of the same experiment.
    pub fn record_evaluation(
        &mut self,
        record: &ExperimentRecord<'_>,
        report: &EvaluationReport,
    ) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .context("failed to start ledger transaction")?;

        tx.execute(
            "DELETE FROM fold_scores WHERE experiment_id = ?1",
            [record.experiment_id],
        )?;
        tx.execute(
            "INSERT INTO experiments(experiment_id, name, directory, families, folds, combined, evaluated_at, mean_window_diff)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(experiment_id) DO UPDATE SET
               name=excluded.name,
               directory=excluded.directory,
               families=excluded.families,
               folds=excluded.folds,
               combined=excluded.combined,
               evaluated_at=excluded.evaluated_at,
               mean_window_diff=excluded.mean_window_diff",
            params![
                record.experiment_id,
                report.experiment,
                record.directory.display().to_string(),
                record.families,
                report.folds.len() as i64,
                report.combined,
                record.evaluated_at,
                report.mean.as_ref().map(|mean| mean.hypothesis.window_diff),
            ],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO fold_scores(experiment_id, fold, system, window_diff, pk, ghd, accuracy, precision, recall, f1, boundaries)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for fold in &report.folds {
                let systems = [
                    ("hypothesis", Some(&fold.hypothesis)),
                    ("naive", Some(&fold.naive)),
                    ("thematic", fold.thematic.as_ref()),
                ];
                for (system, scores) in systems {
                    let Some(scores) = scores else { continue };
                    insert.execute(params![
                        record.experiment_id,
                        fold.fold as i64,
                        system,
                        scores.window_diff,
                        scores.pk,
                        scores.ghd,
                        scores.accuracy,
                        scores.precision,
                        scores.recall,
                        scores.f1,
                        scores.boundaries,
                    ])?;
                }
            }
        }

        tx.commit().context("failed to commit ledger transaction")?;
        Ok(())
    }

    pub fn list_experiments(&self) -> Result<Vec<ExperimentSummary>> {
        let mut statement = self.connection.prepare(
            "SELECT experiment_id, name, directory, families, folds, combined, evaluated_at, mean_window_diff
             FROM experiments
             ORDER BY evaluated_at DESC, experiment_id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(ExperimentSummary {
                experiment_id: row.get(0)?,
                name: row.get(1)?,
                directory: row.get(2)?,
                families: row.get(3)?,
                folds: row.get(4)?,
                combined: row.get(5)?,
                evaluated_at: row.get(6)?,
                mean_window_diff: row.get(7)?,
            })
        })?;

        let mut experiments = Vec::new();
        for row in rows {
            experiments.push(row?);
        }
        Ok(experiments)
    }

    pub fn fold_scores(&self, experiment_id: &str) -> Result<Vec<StoredScores>> {
        let mut statement = self.connection.prepare(
            "SELECT fold, system, window_diff, pk, ghd, accuracy, precision, recall, f1, boundaries
             FROM fold_scores
             WHERE experiment_id = ?1
             ORDER BY fold, system",
        )?;
        let rows = statement.query_map([experiment_id], |row| {
            Ok(StoredScores {
                fold: row.get(0)?,
                system: row.get(1)?,
                scores: SegmentationScores {
                    window_diff: row.get(2)?,
                    pk: row.get(3)?,
                    ghd: row.get(4)?,
                    accuracy: row.get(5)?,
                    precision: row.get(6)?,
                    recall: row.get(7)?,
                    f1: row.get(8)?,
                    boundaries: row.get(9)?,
                },
            })
        })?;

        let mut scores = Vec::new();
        for row in rows {
            scores.push(row?);
        }
        Ok(scores)
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let version = self
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'ledger_schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS experiments (
          experiment_id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          directory TEXT NOT NULL,
          families TEXT NOT NULL,
          folds INTEGER NOT NULL,
          combined INTEGER NOT NULL,
          evaluated_at TEXT NOT NULL,
          mean_window_diff REAL
        );

        CREATE TABLE IF NOT EXISTS fold_scores (
          experiment_id TEXT NOT NULL,
          fold INTEGER NOT NULL,
          system TEXT NOT NULL,
          window_diff REAL NOT NULL,
          pk REAL NOT NULL,
          ghd REAL NOT NULL,
          accuracy REAL NOT NULL,
          precision REAL,
          recall REAL,
          f1 REAL,
          boundaries REAL NOT NULL,
          PRIMARY KEY (experiment_id, fold, system),
          FOREIGN KEY (experiment_id) REFERENCES experiments(experiment_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_experiments_evaluated_at ON experiments(evaluated_at);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('ledger_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [LEDGER_SCHEMA_VERSION],
    )?;
    Ok(())
}
