//! Store abstraction over grade persistence
//!
//! Callers go through [`GradeStore`] and never touch the backing file.

use crate::error::LedgerResult;
use crate::types::{
    DeleteOutcome, GradeDate, GradeEntry, GradeRecord, GradeStats, GradeType, GradeValue,
    UpsertOutcome,
};

/// Date-keyed grade storage
///
/// Implementations keep at most one record per date and never persist a
/// record whose three grades are all empty.
pub trait GradeStore {
    /// All records in storage order, re-read on every call
    fn load(&self) -> LedgerResult<Vec<GradeRecord>>;

    /// Set one grade, creating the record for a new date
    fn upsert(
        &self,
        date: GradeDate,
        grade_type: GradeType,
        value: &GradeValue,
    ) -> LedgerResult<UpsertOutcome>;

    /// Set one grade on an existing record only
    fn update(&self, date: GradeDate, grade_type: GradeType, value: &GradeValue)
        -> LedgerResult<()>;

    /// Clear one grade on behalf of `actor`, pruning the record once empty
    fn delete(
        &self,
        date: GradeDate,
        grade_type: GradeType,
        actor: &str,
    ) -> LedgerResult<DeleteOutcome>;

    /// Counts of non-empty grade cells
    fn stats(&self) -> LedgerResult<GradeStats>;

    /// Every positive grade as a flat entry
    fn export(&self) -> LedgerResult<Vec<GradeEntry>>;
}
