//! Caller payloads and their validation
//!
//! These mirror the JSON bodies the dashboard sends. Every field is optional
//! at the serde level so that a missing field surfaces as
//! [`ValidationError::MissingField`] instead of a decode failure.

use crate::error::ValidationError;
use crate::types::{GradeDate, GradeType, GradeValue, NumericInput};
use serde::Deserialize;

/// Body of an upload or update request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpsertRequest {
    /// `YYYY/M/D`
    #[serde(default)]
    pub date: Option<String>,
    /// `feed`, `product` or `tailing`
    #[serde(default)]
    pub grade_type: Option<String>,
    /// Percentage in `[0, 100]`
    #[serde(default)]
    pub grade_value: Option<NumericInput>,
}

/// Validated upsert arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ValidUpsert {
    /// Date key
    pub date: GradeDate,
    /// Targeted grade
    pub grade_type: GradeType,
    /// New value
    pub value: GradeValue,
}

impl UpsertRequest {
    /// Check required fields, date shape, grade type and value range
    pub fn validate(&self) -> Result<ValidUpsert, ValidationError> {
        let date = required(self.date.as_deref(), "date")?;
        let grade_type = required(self.grade_type.as_deref(), "grade_type")?;
        let value = self
            .grade_value
            .as_ref()
            .filter(|v| !v.as_text().is_empty())
            .ok_or(ValidationError::MissingField("grade_value"))?;

        Ok(ValidUpsert {
            date: date.parse()?,
            grade_type: grade_type.parse()?,
            value: GradeValue::try_from(value)?,
        })
    }
}

/// Body of a delete request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeleteRequest {
    /// `YYYY/M/D`
    #[serde(default)]
    pub date: Option<String>,
    /// `feed`, `product` or `tailing`
    #[serde(default)]
    pub grade_type: Option<String>,
    /// Operator performing the delete; required, not stored in the table
    #[serde(default)]
    pub recorded_by: Option<String>,
}

/// Validated delete arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDelete {
    /// Date key
    pub date: GradeDate,
    /// Grade to clear
    pub grade_type: GradeType,
    /// Operator
    pub actor: String,
}

impl DeleteRequest {
    /// Check required fields, date shape and grade type
    pub fn validate(&self) -> Result<ValidDelete, ValidationError> {
        let date = required(self.date.as_deref(), "date")?;
        let grade_type = required(self.grade_type.as_deref(), "grade_type")?;
        let actor = required(self.recorded_by.as_deref(), "recorded_by")?;

        Ok(ValidDelete {
            date: date.parse()?,
            grade_type: grade_type.parse()?,
            actor: actor.to_string(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}
