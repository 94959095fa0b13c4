//! Testing utilities for the grade ledger workspace
//!
//! Temporary ledgers, fixtures, and parsing shorthands.

#![allow(missing_docs)]

use grade_ledger::{CsvGradeLedger, GradeDate, GradeValue, LedgerConfig, DEFAULT_HEADER};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Table with a full row, a partial row, an all-zero row, a malformed line
/// and an extra column
pub const SAMPLE_TABLE: &str = "\
day,month,year,feed_grade,product_grade,tailing_grade
10,5,1403,62.5,58.0,
11,5,1403,61,,1.2
12,5,1403,0,0,0
bad line
13,5,1403,60,57,1.1,note
";

/// Ledger over a file inside its own temporary directory
pub struct TempLedger {
    dir: TempDir,
    ledger: CsvGradeLedger,
}

impl TempLedger {
    /// Ledger whose table file does not exist yet
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::new(dir.path().join("real_grades.csv"));
        Self {
            ledger: CsvGradeLedger::new(config),
            dir,
        }
    }

    /// Ledger over a table file seeded with `contents`
    pub fn with_contents(contents: &str) -> Self {
        let temp = Self::new();
        fs::write(temp.path(), contents).unwrap();
        temp
    }

    /// Ledger over [`SAMPLE_TABLE`]
    pub fn sample() -> Self {
        Self::with_contents(SAMPLE_TABLE)
    }

    /// Ledger over a header-only table
    pub fn empty_table() -> Self {
        Self::with_contents(&format!("{DEFAULT_HEADER}\n"))
    }

    pub fn ledger(&self) -> &CsvGradeLedger {
        &self.ledger
    }

    pub fn path(&self) -> &Path {
        self.ledger.path()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.ledger.config().backup_dir.clone()
    }

    /// Current table file text
    pub fn contents(&self) -> String {
        fs::read_to_string(self.path()).unwrap()
    }

    /// Files currently in the backup directory, sorted
    pub fn backups(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.backup_dir()) else {
            return Vec::new();
        };
        let mut paths: Vec<_> = entries.map(|e| e.unwrap().path()).collect();
        paths.sort();
        paths
    }
}

impl Default for TempLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `YYYY/M/D` date
pub fn date(text: &str) -> GradeDate {
    text.parse().unwrap()
}

/// Parse a grade value
pub fn value(text: &str) -> GradeValue {
    text.parse().unwrap()
}

/// Header followed by the given rows, newline-terminated
pub fn table(rows: &[&str]) -> String {
    let mut out = format!("{DEFAULT_HEADER}\n");
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}
