//! In-memory tabular data.
//!
//! A [`Table`] is an ordered list of column names plus row-major [`Cell`]s.
//! Every row has exactly one cell per column; keys missing from a source
//! record are stored as [`Cell::Null`].

use std::fmt;

use rustc_hash::FxHashMap;
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// A single loosely-typed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
}

impl Cell {
    /// Convert a JSON value into a cell.
    ///
    /// Arrays and objects are not flattened; they are kept as their JSON text.
    pub fn from_json(value: Value) -> Cell {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => Cell::Number(n),
            Value::String(s) => Cell::Str(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Cell::Str(nested.to_string()),
        }
    }

    /// The string payload, if this is a string cell.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Str(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Str(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Number(n.into())
    }
}

/// An ordered, rectangular table of cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from JSON records.
    ///
    /// The column set is the union of every record's keys in first-seen
    /// order, so heterogeneous records are tolerated.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let records: Vec<_> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for record in &records {
            for key in record.keys() {
                if !index.contains_key(key) {
                    index.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut row = vec![Cell::Null; columns.len()];
            for (key, value) in record {
                row[index[&key]] = Cell::from_json(value);
            }
            rows.push(row);
        }

        Self { columns, rows }
    }

    /// Append a row. Short rows are padded with nulls, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of the first column with this name.
    #[inline]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`] but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| Error::UnknownColumn {
            column: name.to_string(),
        })
    }

    /// Iterate the cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell> + '_> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// The cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the rows for which `keep` returns true, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Cell]) -> bool,
    {
        self.rows.retain(|row| keep(row.as_slice()));
    }

    /// Concatenate `other`'s columns to the right of this table's.
    ///
    /// Both tables must have the same number of rows; rows are paired by
    /// position.
    pub fn hconcat(&self, other: &Table) -> Table {
        debug_assert_eq!(self.len(), other.len(), "hconcat of misaligned tables");

        let columns = self
            .columns
            .iter()
            .chain(other.columns.iter())
            .cloned()
            .collect();
        let rows = self
            .rows
            .iter()
            .zip(other.rows.iter())
            .map(|(left, right)| left.iter().chain(right.iter()).cloned().collect())
            .collect();

        Table { columns, rows }
    }
}
