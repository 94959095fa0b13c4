//! Grade Ledger
//!
//! Daily ore-grade records (feed, product and tailing percentages) keyed by
//! date and stored as a flat comma-separated table.
//!
//! # Core Concepts
//!
//! - [`GradeStore`]: Store abstraction (load, upsert, update, delete, stats, export)
//! - [`CsvGradeLedger`]: File-backed store with locked whole-table rewrites
//! - [`GradeTable`]: Parsed table; all mutation rules live here
//! - [`GradeDate`]: Date key normalized to `(year, month, day)`
//! - [`GradeValue`]: Validated percentage that keeps its textual form
//!
//! # Table Format
//!
//! ```text
//! day,month,year,feed_grade,product_grade,tailing_grade
//! 10,5,1403,62.5,58.0,
//! ```
//!
//! One row per date. A row whose three grades are all empty is removed.
//!
//! # Example
//!
//! ```rust,no_run
//! use grade_ledger::{CsvGradeLedger, GradeStore, GradeType};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = CsvGradeLedger::open("real_grades.csv");
//!
//! let date = "1403/5/10".parse()?;
//! ledger.upsert(date, GradeType::Feed, &"62.5".parse()?)?;
//! ledger.delete(date, GradeType::Feed, "operator")?;
//!
//! println!("{:?}", ledger.stats()?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod batch;
pub mod config;
pub mod error;
pub mod ledger;
mod lock;
pub mod request;
pub mod store;
pub mod table;
pub mod types;

// Re-exports
pub use batch::{BatchGrade, BatchImport, BatchReport};
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, LedgerResult, StorageError, StorageOp, ValidationError};
pub use ledger::{CsvGradeLedger, PruneReport};
pub use request::{DeleteRequest, UpsertRequest, ValidDelete, ValidUpsert};
pub use store::GradeStore;
pub use table::{GradeTable, DEFAULT_HEADER};
pub use types::{
    DeleteOutcome, GradeDate, GradeEntry, GradeRecord, GradeStats, GradeType, GradeValue,
    NumericInput, TypeCounts, UpsertOutcome,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
