//! In-memory grade table
//!
//! [`GradeTable`] is the parsed form of the ledger file. It owns the header
//! line and every data line in file order. Lines that do not parse as a
//! record (fewer than six cells, or non-integer date cells) are carried as
//! raw text and written back unchanged.
//!
//! All mutation logic lives here; the file-backed ledger only adds locking
//! and IO around it.

use crate::error::{LedgerError, LedgerResult};
use crate::types::{
    DeleteOutcome, GradeDate, GradeEntry, GradeRecord, GradeStats, GradeType, GradeValue,
    UpsertOutcome,
};
use std::borrow::Cow;

/// Header written to new tables
pub const DEFAULT_HEADER: &str = "day,month,year,feed_grade,product_grade,tailing_grade";

/// Cells a line needs before it is treated as a record
const RECORD_CELLS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
enum Row {
    Record(GradeRecord),
    Raw(String),
}

/// Parsed ledger table
#[derive(Debug, Clone, PartialEq)]
pub struct GradeTable {
    header: String,
    rows: Vec<Row>,
}

impl Default for GradeTable {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER)
    }
}

impl GradeTable {
    /// Empty table with the given header line
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            rows: Vec::new(),
        }
    }

    /// Parse table text
    ///
    /// The first line is the header. Blank lines are dropped. Empty input
    /// yields an empty table with `default_header`.
    #[must_use]
    pub fn parse(text: &str, default_header: &str) -> Self {
        let mut lines = text.lines();
        let header = match lines.next() {
            Some(line) if !line.trim().is_empty() => line.to_string(),
            _ => default_header.to_string(),
        };

        let rows = lines
            .filter(|line| !line.trim().is_empty())
            .map(parse_row)
            .collect();

        Self { header, rows }
    }

    /// Render the table back to text, one `\n`-terminated line per row
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + 1 + self.rows.len() * 24);
        out.push_str(&self.header);
        out.push('\n');
        for row in &self.rows {
            match row {
                Row::Record(record) => out.push_str(&render_record(record)),
                Row::Raw(line) => out.push_str(line),
            }
            out.push('\n');
        }
        out
    }

    /// Header line
    #[inline]
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Parsed records in file order
    pub fn records(&self) -> impl Iterator<Item = &GradeRecord> {
        self.rows.iter().filter_map(|row| match row {
            Row::Record(record) => Some(record),
            Row::Raw(_) => None,
        })
    }

    /// Lines carried through without parsing
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().filter_map(|row| match row {
            Row::Raw(line) => Some(line.as_str()),
            Row::Record(_) => None,
        })
    }

    /// Number of parsed records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().count()
    }

    /// True when the table holds no parsed records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records().next().is_none()
    }

    /// Record for a date key
    #[must_use]
    pub fn get(&self, date: GradeDate) -> Option<&GradeRecord> {
        self.records().find(|record| record.date == date)
    }

    fn find_mut(&mut self, date: GradeDate) -> Option<(usize, &mut GradeRecord)> {
        self.rows
            .iter_mut()
            .enumerate()
            .find_map(|(index, row)| match row {
                Row::Record(record) if record.date == date => Some((index, record)),
                _ => None,
            })
    }

    /// Set one grade for a date, appending a row if the date is new
    pub fn upsert(
        &mut self,
        date: GradeDate,
        grade_type: GradeType,
        value: &GradeValue,
    ) -> UpsertOutcome {
        if let Some((_, record)) = self.find_mut(date) {
            record.set(grade_type, value);
            return UpsertOutcome::Updated;
        }

        let mut record = GradeRecord::new(date);
        record.set(grade_type, value);
        self.rows.push(Row::Record(record));
        UpsertOutcome::Inserted
    }

    /// Set one grade for an existing date
    ///
    /// # Errors
    /// [`LedgerError::RecordNotFound`] when no row has the date key.
    pub fn update(
        &mut self,
        date: GradeDate,
        grade_type: GradeType,
        value: &GradeValue,
    ) -> LedgerResult<()> {
        let (_, record) = self
            .find_mut(date)
            .ok_or(LedgerError::RecordNotFound { date })?;
        record.set(grade_type, value);
        Ok(())
    }

    /// Clear one grade; drop the row once all three grades are empty
    ///
    /// # Errors
    /// [`LedgerError::RecordNotFound`] when no row has the date key.
    pub fn clear(&mut self, date: GradeDate, grade_type: GradeType) -> LedgerResult<DeleteOutcome> {
        let (index, record) = self
            .find_mut(date)
            .ok_or(LedgerError::RecordNotFound { date })?;

        record.clear(grade_type);
        if !record.is_blank() {
            return Ok(DeleteOutcome::Cleared);
        }

        self.rows.remove(index);
        Ok(DeleteOutcome::RowPruned)
    }

    /// Drop every record none of whose grades is a positive number
    ///
    /// Raw lines are kept. Returns the number of removed rows.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| match row {
            Row::Record(record) => GradeType::ALL
                .iter()
                .any(|t| record.positive_value(*t).is_some()),
            Row::Raw(_) => true,
        });
        before - self.rows.len()
    }

    /// Drop every record whose three grades are all empty
    ///
    /// Run before each write so a blank row never reaches disk, even one
    /// that was already in the file. Returns the number of removed rows.
    pub fn drop_blank(&mut self) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|row| !matches!(row, Row::Record(record) if record.is_blank()));
        before - self.rows.len()
    }

    /// Remove every data line, keeping the header
    pub fn clear_all(&mut self) {
        self.rows.clear();
    }

    /// Count non-empty grade cells, overall, per type and per date
    #[must_use]
    pub fn stats(&self) -> GradeStats {
        let mut stats = GradeStats::default();
        for record in self.records() {
            let per_date = stats.by_date.entry(record.date).or_insert(0);
            for grade_type in GradeType::ALL {
                if record.is_present(grade_type) {
                    stats.total_records += 1;
                    stats.by_type.increment(grade_type);
                    *per_date += 1;
                }
            }
        }
        stats
    }

    /// Flatten every positive numeric grade into an entry
    ///
    /// Row order, then feed, product, tailing within a row.
    #[must_use]
    pub fn export(&self) -> Vec<GradeEntry> {
        self.records()
            .flat_map(|record| {
                GradeType::ALL.into_iter().filter_map(move |grade_type| {
                    record.positive_value(grade_type).map(|grade_value| GradeEntry {
                        date: record.date,
                        grade_type,
                        grade_value,
                    })
                })
            })
            .collect()
    }
}

fn parse_row(line: &str) -> Row {
    let mut cells = split_cells(line);
    if cells.len() < RECORD_CELLS {
        return Row::Raw(line.to_string());
    }

    let Some(date) = GradeDate::from_columns(&cells[0], &cells[1], &cells[2]) else {
        return Row::Raw(line.to_string());
    };

    let extra = cells.split_off(RECORD_CELLS);
    let mut grades = cells.drain(3..);
    Row::Record(GradeRecord {
        date,
        feed: grades.next().unwrap_or_default(),
        product: grades.next().unwrap_or_default(),
        tailing: grades.next().unwrap_or_default(),
        extra,
    })
}

/// Split a line into trimmed cells
///
/// A cell wrapped in double quotes may contain commas; `""` inside it is a
/// literal quote. Quotes elsewhere are kept as text.
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if cell.trim().is_empty() => {
                cell.clear();
                quoted = true;
            }
            ',' if !quoted => cells.push(finish_cell(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(finish_cell(&mut cell));
    cells
}

fn finish_cell(cell: &mut String) -> String {
    let text = std::mem::take(cell);
    text.trim().to_string()
}

/// Quote a cell that would otherwise split or unbalance the line
fn quote_cell(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

fn render_record(record: &GradeRecord) -> String {
    let mut line = format!(
        "{},{},{}",
        record.date.day(),
        record.date.month(),
        record.date.year()
    );
    let cells = [&record.feed, &record.product, &record.tailing]
        .into_iter()
        .chain(&record.extra);
    for cell in cells {
        line.push(',');
        line.push_str(&quote_cell(cell));
    }
    line
}
