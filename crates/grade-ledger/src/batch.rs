//! Batch grade import
//!
//! Accepts the dashboard's bulk upload document: one entry per date with up
//! to three grades. Entries are applied as upserts inside a single locked
//! rewrite. Bad entries are reported and skipped; they never abort the batch.

use crate::error::ValidationError;
use crate::table::GradeTable;
use crate::types::{GradeDate, GradeType, GradeValue, NumericInput};
use serde::{Deserialize, Serialize};

/// Bulk upload document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchImport {
    /// Entries to apply, in order
    pub grades: Vec<BatchGrade>,
    /// Back up and empty the table before applying
    #[serde(default)]
    pub clear_existing: bool,
}

/// One date's grades in a bulk upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchGrade {
    /// Four-digit year
    pub year: NumericInput,
    /// Month number
    pub month: NumericInput,
    /// Day of month
    pub day: NumericInput,
    /// Feed grade, skipped when absent, blank, `"0"` or numeric zero
    #[serde(default)]
    pub feed_grade: Option<NumericInput>,
    /// Product grade, same rule
    #[serde(default)]
    pub product_grade: Option<NumericInput>,
    /// Tailing grade, same rule
    #[serde(default)]
    pub tailing_grade: Option<NumericInput>,
}

impl BatchGrade {
    fn label(&self) -> String {
        format!(
            "{}/{}/{}",
            self.day.as_text(),
            self.month.as_text(),
            self.year.as_text()
        )
    }

    fn date(&self) -> Result<GradeDate, String> {
        let text = format!(
            "{}/{}/{}",
            self.year.as_text(),
            self.month.as_text(),
            self.day.as_text()
        );
        text.parse().map_err(|e: ValidationError| e.to_string())
    }

    fn grades(&self) -> impl Iterator<Item = (GradeType, &NumericInput)> {
        [
            (GradeType::Feed, self.feed_grade.as_ref()),
            (GradeType::Product, self.product_grade.as_ref()),
            (GradeType::Tailing, self.tailing_grade.as_ref()),
        ]
        .into_iter()
        .filter_map(|(grade_type, input)| input.map(|i| (grade_type, i)))
        .filter(|(_, input)| !input.is_blank_or_zero())
    }
}

/// Outcome of a bulk upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Grades written
    pub uploaded_count: usize,
    /// One message per rejected grade or entry
    pub errors: Vec<String>,
}

impl BatchImport {
    /// Apply every entry to the table
    ///
    /// Grades that are absent, blank, `"0"` or numeric zero are skipped
    /// silently. An entry with a bad date is rejected whole; a bad grade
    /// only rejects itself.
    pub fn apply(&self, table: &mut GradeTable) -> BatchReport {
        let mut report = BatchReport::default();

        for entry in &self.grades {
            let date = match entry.date() {
                Ok(date) => date,
                Err(message) => {
                    report.errors.push(format!("record {}: {message}", entry.label()));
                    continue;
                }
            };

            for (grade_type, input) in entry.grades() {
                match GradeValue::try_from(input) {
                    Ok(value) => {
                        table.upsert(date, grade_type, &value);
                        report.uploaded_count += 1;
                    }
                    Err(e) => report
                        .errors
                        .push(format!("record {} {grade_type}: {e}", entry.label())),
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DEFAULT_HEADER;
    use pretty_assertions::assert_eq;

    fn import(json: &str) -> BatchImport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn applies_non_empty_grades() {
        let batch = import(
            r#"{"grades": [
                {"year": 1403, "month": 2, "day": 1, "feed_grade": 55.5, "product_grade": "61", "tailing_grade": ""},
                {"year": "1403", "month": "2", "day": "2", "tailing_grade": 0}
            ]}"#,
        );
        let mut table = GradeTable::default();
        let report = batch.apply(&mut table);

        assert_eq!(report.uploaded_count, 2);
        assert!(report.errors.is_empty());
        assert_eq!(
            table.render(),
            format!("{DEFAULT_HEADER}\n1,2,1403,55.5,61,\n")
        );
        assert!(!batch.clear_existing);
    }

    #[test]
    fn zero_text_with_decimals_is_kept() {
        let batch = import(
            r#"{"grades": [{"year": 1403, "month": 2, "day": 4, "feed_grade": "0.0", "product_grade": "0", "tailing_grade": 0.0}]}"#,
        );
        let mut table = GradeTable::default();
        let report = batch.apply(&mut table);

        assert_eq!(report.uploaded_count, 1);
        assert_eq!(table.render(), format!("{DEFAULT_HEADER}\n4,2,1403,0.0,,\n"));
    }

    #[test]
    fn merges_into_existing_rows() {
        let mut table = GradeTable::parse(&format!("{DEFAULT_HEADER}\n1,2,1403,50,,\n"), DEFAULT_HEADER);
        let batch = import(r#"{"grades": [{"year": 1403, "month": 2, "day": 1, "tailing_grade": 2.25}]}"#);
        batch.apply(&mut table);
        assert_eq!(table.render(), format!("{DEFAULT_HEADER}\n1,2,1403,50,,2.25\n"));
    }

    #[test]
    fn reports_bad_entries_and_continues() {
        let batch = import(
            r#"{"clear_existing": true, "grades": [
                {"year": 14, "month": 2, "day": 1, "feed_grade": 5},
                {"year": 1403, "month": 2, "day": 3, "feed_grade": 150, "product_grade": 7}
            ]}"#,
        );
        let mut table = GradeTable::default();
        let report = batch.apply(&mut table);

        assert!(batch.clear_existing);
        assert_eq!(report.uploaded_count, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("record 1/2/14"));
        assert!(report.errors[1].contains("feed"));
        assert_eq!(table.get("1403/2/3".parse().unwrap()).unwrap().product, "7");
    }
}
