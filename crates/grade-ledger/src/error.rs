//! Error types for the grade ledger
//!
//! Three families, none of them retried automatically:
//! - Validation (bad input, nothing written)
//! - Not found (missing table or date key, nothing mutated)
//! - Storage (open/read/write failures, with path and permission bits)

use crate::types::GradeDate;
use std::fmt;
use std::path::{Path, PathBuf};

/// Rejected caller input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Required field absent or blank
    #[error("field {0} is required")]
    MissingField(&'static str),

    /// Date not shaped like `YYYY/M/D`
    #[error("invalid date '{0}': expected YYYY/M/D")]
    InvalidDate(String),

    /// Grade type not one of feed, product, tailing
    #[error("unknown grade type '{0}': expected feed, product or tailing")]
    UnknownGradeType(String),

    /// Grade value is not a number
    #[error("grade value '{0}' is not a number")]
    NotNumeric(String),

    /// Grade value outside `[0, 100]`
    #[error("grade value {0} must be between 0 and 100")]
    OutOfRange(f64),
}

/// Filesystem operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// Opening the table file
    Open,
    /// Acquiring the advisory lock
    Lock,
    /// Reading the table
    Read,
    /// Rewriting the table
    Write,
    /// Writing a backup copy
    Backup,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Lock => "lock",
            Self::Read => "read",
            Self::Write => "write",
            Self::Backup => "back up",
        })
    }
}

/// IO failure on the backing file
#[derive(Debug, thiserror::Error)]
#[error(
    "failed to {op} {} (permissions {}): {source}",
    .path.display(),
    .permissions.as_deref().unwrap_or("unknown")
)]
pub struct StorageError {
    /// What was being attempted
    pub op: StorageOp,
    /// Path that was being accessed
    pub path: PathBuf,
    /// Permission bits of the path as four-digit octal, when readable
    pub permissions: Option<String>,
    /// Underlying IO error
    #[source]
    pub source: std::io::Error,
}

impl StorageError {
    /// Create storage error for path, capturing its current permission bits
    pub fn new(op: StorageOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let permissions = permission_bits(&path);
        Self {
            op,
            path,
            permissions,
            source,
        }
    }
}

#[cfg(unix)]
fn permission_bits(path: &Path) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .ok()
        .map(|meta| format!("{:04o}", meta.permissions().mode() & 0o7777))
}

#[cfg(not(unix))]
fn permission_bits(path: &Path) -> Option<String> {
    std::fs::metadata(path).ok().map(|meta| {
        if meta.permissions().readonly() {
            "readonly".to_string()
        } else {
            "writable".to_string()
        }
    })
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input rejected
    Validation,
    /// Table or record absent
    NotFound,
    /// Filesystem failure
    Storage,
}

impl ErrorKind {
    /// Short machine-readable label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::Storage => "storage_error",
        }
    }
}

/// Main ledger error type
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Invalid input
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// No record for the date key
    #[error("no grades recorded for {date}")]
    RecordNotFound {
        /// Requested date
        date: GradeDate,
    },

    /// Table file does not exist
    #[error("grade table {} does not exist", .path.display())]
    TableMissing {
        /// Configured table path
        path: PathBuf,
    },

    /// Filesystem failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// Create storage error for path
    pub fn storage(op: StorageOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage(StorageError::new(op, path, source))
    }

    /// Error category
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::RecordNotFound { .. } | Self::TableMissing { .. } => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
