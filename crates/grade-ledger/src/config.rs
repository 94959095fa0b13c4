//! Ledger configuration

use crate::table::DEFAULT_HEADER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Table file used when none is configured
pub const DEFAULT_TABLE_FILE: &str = "real_grades.csv";

/// Backup directory name, resolved next to the table file
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Where the ledger lives and how new tables are laid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Table file
    pub path: PathBuf,
    /// Directory receiving timestamped backup copies
    pub backup_dir: PathBuf,
    /// Header line written when the table is created
    pub header: String,
}

impl LedgerConfig {
    /// Configuration for a table file, with backups in a sibling `backups/`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_dir = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(DEFAULT_BACKUP_DIR);
        Self {
            path,
            backup_dir,
            header: DEFAULT_HEADER.to_string(),
        }
    }

    /// With backup directory
    #[inline]
    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    /// With header for newly created tables
    #[inline]
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_FILE)
    }
}
