//! Row filtering on exact column equality.

use crate::error::Result;
use crate::table::Table;

/// What to do with the filter options given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterCriteria {
    /// Keep rows where `column` equals `value`.
    Apply { column: String, value: String },
    /// A column was named without a value; no filtering happens.
    MissingValue { column: String },
    /// A value was given without a column; no filtering happens.
    MissingColumn { value: String },
    /// Nothing was given; the caller previews the table instead.
    None,
}

impl FilterCriteria {
    pub fn from_options(column: Option<&str>, value: Option<&str>) -> Self {
        match (column, value) {
            (Some(column), Some(value)) => FilterCriteria::Apply {
                column: column.to_string(),
                value: value.to_string(),
            },
            (Some(column), None) => FilterCriteria::MissingValue {
                column: column.to_string(),
            },
            (None, Some(value)) => FilterCriteria::MissingColumn {
                value: value.to_string(),
            },
            (None, None) => FilterCriteria::None,
        }
    }
}

/// Keep only rows whose `column` cell is the string `value`.
///
/// Comparison is exact: no trimming, case folding or numeric coercion.
/// Null and non-string cells never match.
pub fn apply(mut table: Table, column: &str, value: &str) -> Result<Table> {
    let idx = table.require_column(column)?;
    let before = table.len();
    table.retain(|row| row[idx].as_str() == Some(value));
    log::debug!(
        "filter {} == {:?} kept {} of {} rows",
        column,
        value,
        table.len(),
        before
    );
    Ok(table)
}
