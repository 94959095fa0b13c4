//! Core types for the grade ledger
//!
//! Defines the values that flow through the ledger:
//! - Date keys normalized to `(year, month, day)`
//! - Grade types (feed / product / tailing)
//! - Validated grade values that keep their textual form
//! - Records, export entries and aggregate stats

use crate::error::ValidationError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").expect("date pattern is valid"));

/// Calendar date key of a grade record
///
/// Parsed from `YYYY/M/D` text and compared as integers, so `1403/05/10`
/// and `1403/5/10` address the same record. No calendar validation is
/// performed; the dashboard works in the Jalali calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GradeDate {
    year: u32,
    month: u32,
    day: u32,
}

impl GradeDate {
    /// Create date key from components
    #[inline]
    #[must_use]
    pub const fn new(year: u32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Build a date key from the `day,month,year` columns of a table row
    ///
    /// Returns `None` when any column is not an unsigned integer.
    #[must_use]
    pub fn from_columns(day: &str, month: &str, year: &str) -> Option<Self> {
        Some(Self {
            year: year.trim().parse().ok()?,
            month: month.trim().parse().ok()?,
            day: day.trim().parse().ok()?,
        })
    }

    /// Year component
    #[inline]
    #[must_use]
    pub const fn year(&self) -> u32 {
        self.year
    }

    /// Month component
    #[inline]
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Day component
    #[inline]
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }
}

impl fmt::Display for GradeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.month, self.day)
    }
}

impl FromStr for GradeDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !DATE_SHAPE.is_match(s) {
            return Err(ValidationError::InvalidDate(s.to_string()));
        }

        let mut parts = s.split('/').map(str::parse::<u32>);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(year)), Some(Ok(month)), Some(Ok(day))) => Ok(Self::new(year, month, day)),
            _ => Err(ValidationError::InvalidDate(s.to_string())),
        }
    }
}

impl Serialize for GradeDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GradeDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Kind of grade measurement
///
/// The dashboard labels are accepted as aliases when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeType {
    /// Mill feed grade
    #[serde(alias = "خوراک")]
    Feed,
    /// Concentrate (product) grade
    #[serde(alias = "محصول")]
    Product,
    /// Tailing grade
    #[serde(alias = "باطله")]
    Tailing,
}

impl GradeType {
    /// All grade types in column order
    pub const ALL: [GradeType; 3] = [GradeType::Feed, GradeType::Product, GradeType::Tailing];

    /// Canonical name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Product => "product",
            Self::Tailing => "tailing",
        }
    }

    /// Dashboard label
    #[inline]
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Feed => "خوراک",
            Self::Product => "محصول",
            Self::Tailing => "باطله",
        }
    }
}

impl fmt::Display for GradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.label() == s)
            .ok_or_else(|| ValidationError::UnknownGradeType(s.to_string()))
    }
}

/// Number supplied by a caller, either as a JSON number or as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    /// JSON number
    Number(serde_json::Number),
    /// Text form (query strings, CLI arguments, spreadsheet cells)
    Text(String),
}

impl NumericInput {
    /// Textual form as the caller supplied it
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }

    /// True for blank text, the literal text `0`, and numeric zero
    ///
    /// Text such as `0.0` is a value, not an omission.
    #[must_use]
    pub fn is_blank_or_zero(&self) -> bool {
        match self {
            Self::Number(n) => n.as_f64() == Some(0.0),
            Self::Text(s) => s.trim().is_empty() || s.as_str() == "0",
        }
    }
}

/// Grade percentage in `[0, 100]`
///
/// Keeps the caller's textual form so `58.0` is written back as `58.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeValue {
    value: f64,
    text: String,
}

impl GradeValue {
    /// Lowest accepted grade
    pub const MIN: f64 = 0.0;
    /// Highest accepted grade
    pub const MAX: f64 = 100.0;

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Text written to the table
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn checked(value: f64, text: String) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotNumeric(text));
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::OutOfRange(value));
        }
        Ok(Self { value, text })
    }
}

impl FromStr for GradeValue {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let value = text
            .parse::<f64>()
            .map_err(|_| ValidationError::NotNumeric(text.to_string()))?;
        Self::checked(value, text.to_string())
    }
}

impl TryFrom<f64> for GradeValue {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // Debug formatting keeps the decimal point: 58.0 -> "58.0"
        Self::checked(value, format!("{value:?}"))
    }
}

impl TryFrom<&NumericInput> for GradeValue {
    type Error = ValidationError;

    fn try_from(input: &NumericInput) -> Result<Self, Self::Error> {
        input.as_text().parse()
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for GradeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value)
    }
}

impl<'de> Deserialize<'de> for GradeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = NumericInput::deserialize(deserializer)?;
        Self::try_from(&input).map_err(de::Error::custom)
    }
}

/// One row of the ledger: the three grades recorded for a date
///
/// Cells hold raw text; an empty cell means the grade is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Date key
    pub date: GradeDate,
    /// Feed grade cell
    pub feed: String,
    /// Product grade cell
    pub product: String,
    /// Tailing grade cell
    pub tailing: String,
    /// Cells beyond the sixth column, written back untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl GradeRecord {
    /// Empty record for a date
    #[inline]
    #[must_use]
    pub fn new(date: GradeDate) -> Self {
        Self {
            date,
            feed: String::new(),
            product: String::new(),
            tailing: String::new(),
            extra: Vec::new(),
        }
    }

    /// Builder: set one grade
    #[must_use]
    pub fn with(mut self, grade_type: GradeType, value: impl Into<String>) -> Self {
        *self.cell_mut(grade_type) = value.into();
        self
    }

    /// Cell text for a grade type
    #[inline]
    #[must_use]
    pub fn get(&self, grade_type: GradeType) -> &str {
        match grade_type {
            GradeType::Feed => &self.feed,
            GradeType::Product => &self.product,
            GradeType::Tailing => &self.tailing,
        }
    }

    fn cell_mut(&mut self, grade_type: GradeType) -> &mut String {
        match grade_type {
            GradeType::Feed => &mut self.feed,
            GradeType::Product => &mut self.product,
            GradeType::Tailing => &mut self.tailing,
        }
    }

    /// Overwrite one grade, leaving the others untouched
    pub fn set(&mut self, grade_type: GradeType, value: &GradeValue) {
        *self.cell_mut(grade_type) = value.as_str().to_string();
    }

    /// Clear one grade, leaving the others untouched
    pub fn clear(&mut self, grade_type: GradeType) {
        self.cell_mut(grade_type).clear();
    }

    /// Whether a grade cell is non-empty (the stats rule)
    #[inline]
    #[must_use]
    pub fn is_present(&self, grade_type: GradeType) -> bool {
        !self.get(grade_type).trim().is_empty()
    }

    /// Numeric grade if it is strictly positive (the export rule)
    #[must_use]
    pub fn positive_value(&self, grade_type: GradeType) -> Option<f64> {
        self.get(grade_type)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// True when all three cells are empty
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        GradeType::ALL.iter().all(|t| !self.is_present(*t))
    }
}

/// Flattened grade, one per non-empty positive cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
    /// Date key
    pub date: GradeDate,
    /// Which grade
    pub grade_type: GradeType,
    /// Grade percentage
    pub grade_value: f64,
}

/// Per-type counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    /// Non-empty feed cells
    pub feed: usize,
    /// Non-empty product cells
    pub product: usize,
    /// Non-empty tailing cells
    pub tailing: usize,
}

impl TypeCounts {
    /// Counter for a grade type
    #[inline]
    #[must_use]
    pub fn get(&self, grade_type: GradeType) -> usize {
        match grade_type {
            GradeType::Feed => self.feed,
            GradeType::Product => self.product,
            GradeType::Tailing => self.tailing,
        }
    }

    pub(crate) fn increment(&mut self, grade_type: GradeType) {
        match grade_type {
            GradeType::Feed => self.feed += 1,
            GradeType::Product => self.product += 1,
            GradeType::Tailing => self.tailing += 1,
        }
    }
}

/// Aggregate counts over the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeStats {
    /// Number of non-empty grade cells
    pub total_records: usize,
    /// Non-empty cells per grade type
    pub by_type: TypeCounts,
    /// Non-empty cells per date, in table order
    pub by_date: IndexMap<GradeDate, usize>,
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// A new row was appended
    Inserted,
    /// An existing row was modified
    Updated,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The grade was cleared and the row still holds other grades
    Cleared,
    /// The grade was the last one; the row was removed
    RowPruned,
}
