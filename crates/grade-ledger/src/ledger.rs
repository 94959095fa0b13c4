//! File-backed grade ledger
//!
//! [`CsvGradeLedger`] stores the grade table as a comma-separated file and
//! rewrites it whole on every mutation. Each operation reloads from disk;
//! nothing is cached between calls, so several processes can share one file.

use crate::batch::{BatchImport, BatchReport};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, StorageOp, ValidationError};
use crate::lock::TableLock;
use crate::store::GradeStore;
use crate::table::GradeTable;
use crate::types::{
    DeleteOutcome, GradeDate, GradeEntry, GradeRecord, GradeStats, GradeType, GradeValue,
    UpsertOutcome,
};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of an empty-row sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Rows removed
    pub removed: usize,
    /// Records left
    pub remaining: usize,
    /// Backup written before the sweep
    pub backup: PathBuf,
}

/// Grade ledger over a flat table file
#[derive(Debug, Clone)]
pub struct CsvGradeLedger {
    config: LedgerConfig,
}

impl CsvGradeLedger {
    /// Create ledger from configuration
    #[inline]
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Ledger over a table file with default settings
    #[inline]
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(LedgerConfig::new(path))
    }

    /// Table file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Parse the table under a shared lock; `None` if the file is missing
    fn read_table(&self) -> LedgerResult<Option<GradeTable>> {
        let Some(mut lock) = TableLock::shared(self.path())? else {
            return Ok(None);
        };
        let text = lock.read_to_string()?;
        tracing::debug!("Loaded grade table {} ({} bytes)", self.path().display(), text.len());
        Ok(Some(GradeTable::parse(&text, &self.config.header)))
    }

    /// Locked read-modify-write
    ///
    /// The table is written back only when `operation` succeeds, minus any
    /// rows left with all three grades empty. Returns
    /// `None` without calling `operation` if the file is missing and
    /// `create` is false.
    fn with_table_exclusive<T>(
        &self,
        create: bool,
        operation: impl FnOnce(&mut GradeTable) -> LedgerResult<T>,
    ) -> LedgerResult<Option<T>> {
        let Some(mut lock) = TableLock::exclusive(self.path(), create)? else {
            return Ok(None);
        };

        let text = lock.read_to_string()?;
        let mut table = GradeTable::parse(&text, &self.config.header);
        let result = operation(&mut table)?;
        let dropped = table.drop_blank();
        if dropped > 0 {
            tracing::debug!("Dropped {} blank grade rows before rewrite", dropped);
        }
        lock.rewrite(&table.render())?;
        drop(lock);

        Ok(Some(result))
    }

    fn missing_table(&self) -> LedgerError {
        LedgerError::TableMissing {
            path: self.path().to_path_buf(),
        }
    }

    /// Copy the current table into the backup directory
    ///
    /// # Errors
    /// [`LedgerError::TableMissing`] when there is nothing to back up.
    pub fn backup(&self) -> LedgerResult<PathBuf> {
        let Some(mut lock) = TableLock::shared(self.path())? else {
            return Err(self.missing_table());
        };
        let text = lock.read_to_string()?;
        self.write_backup(&text)
    }

    fn write_backup(&self, contents: &str) -> LedgerResult<PathBuf> {
        let dir = &self.config.backup_dir;
        fs::create_dir_all(dir).map_err(|e| LedgerError::storage(StorageOp::Backup, dir, e))?;

        let stem = self
            .path()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("grades");
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");

        let mut target = dir.join(format!("{stem}_backup_{stamp}.csv"));
        let mut attempt = 1;
        while target.exists() {
            attempt += 1;
            target = dir.join(format!("{stem}_backup_{stamp}_{attempt}.csv"));
        }

        fs::write(&target, contents)
            .map_err(|e| LedgerError::storage(StorageOp::Backup, &target, e))?;
        tracing::info!("Backed up grade table to {}", target.display());
        Ok(target)
    }

    /// Remove every row none of whose grades is a positive number
    ///
    /// A backup is written first. Unparsed lines are kept.
    pub fn prune_empty(&self) -> LedgerResult<PruneReport> {
        let report = self.with_table_exclusive(false, |table| {
            let backup = self.write_backup(&table.render())?;
            let removed = table.prune_empty();
            Ok(PruneReport {
                removed,
                remaining: table.len(),
                backup,
            })
        })?;

        let report = report.ok_or_else(|| self.missing_table())?;
        tracing::info!(
            "Pruned {} empty grade rows, {} remain",
            report.removed,
            report.remaining
        );
        Ok(report)
    }

    /// Apply a bulk upload as one locked rewrite
    pub fn import_batch(&self, batch: &BatchImport) -> LedgerResult<BatchReport> {
        let report = self.with_table_exclusive(true, |table| {
            if batch.clear_existing {
                if !table.is_empty() || table.raw_lines().next().is_some() {
                    self.write_backup(&table.render())?;
                }
                table.clear_all();
            }
            Ok(batch.apply(table))
        })?;

        let report = report.ok_or_else(|| self.missing_table())?;
        tracing::info!(
            "Batch upload wrote {} grades ({} rejected)",
            report.uploaded_count,
            report.errors.len()
        );
        Ok(report)
    }
}

impl GradeStore for CsvGradeLedger {
    fn load(&self) -> LedgerResult<Vec<GradeRecord>> {
        Ok(self
            .read_table()?
            .map(|table| table.records().cloned().collect())
            .unwrap_or_default())
    }

    fn upsert(
        &self,
        date: GradeDate,
        grade_type: GradeType,
        value: &GradeValue,
    ) -> LedgerResult<UpsertOutcome> {
        let outcome = self
            .with_table_exclusive(true, |table| Ok(table.upsert(date, grade_type, value)))?
            .ok_or_else(|| self.missing_table())?;

        tracing::info!("Grade recorded: {} {} = {} ({:?})", date, grade_type, value, outcome);
        Ok(outcome)
    }

    fn update(
        &self,
        date: GradeDate,
        grade_type: GradeType,
        value: &GradeValue,
    ) -> LedgerResult<()> {
        self.with_table_exclusive(false, |table| table.update(date, grade_type, value))?
            .ok_or_else(|| self.missing_table())?;

        tracing::info!("Grade updated: {} {} = {}", date, grade_type, value);
        Ok(())
    }

    fn delete(
        &self,
        date: GradeDate,
        grade_type: GradeType,
        actor: &str,
    ) -> LedgerResult<DeleteOutcome> {
        if actor.trim().is_empty() {
            return Err(ValidationError::MissingField("recorded_by").into());
        }

        let outcome = self
            .with_table_exclusive(false, |table| table.clear(date, grade_type))?
            .ok_or_else(|| self.missing_table())?;

        tracing::info!("Grade deleted: {} {} by {} ({:?})", date, grade_type, actor, outcome);
        Ok(outcome)
    }

    fn stats(&self) -> LedgerResult<GradeStats> {
        Ok(self
            .read_table()?
            .map(|table| table.stats())
            .unwrap_or_default())
    }

    fn export(&self) -> LedgerResult<Vec<GradeEntry>> {
        Ok(self
            .read_table()?
            .map(|table| table.export())
            .unwrap_or_default())
    }
}
