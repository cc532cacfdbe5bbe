use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};

use crate::error::Error;
use crate::table::{Cell, Table};

/// Column added to every record of a grouped JSON document.
pub const GROUP_KEY_COLUMN: &str = "key";

/// The supported input formats, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Detect the format from the file extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.csv` or `.json`.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        let ext = path.extension()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(SourceFormat::Csv)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(SourceFormat::Json)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "csv"),
            SourceFormat::Json => write!(f, "json"),
        }
    }
}

/// Load a whole input file into memory as a [`Table`].
pub fn load(path: &Utf8Path, format: SourceFormat) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("failed to open file: {}", path))?;
    let reader = BufReader::new(file);

    let table = match format {
        SourceFormat::Csv => read_csv(reader),
        SourceFormat::Json => read_json(reader),
    }
    .with_context(|| format!("failed to load {} input: {}", format, path))?;

    log::debug!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path
    );
    Ok(table)
}

/// Read CSV with a header row.
///
/// Every field is kept as a string, with no type inference, and empty
/// fields become nulls. Rows shorter than the header are padded with nulls;
/// longer rows are an error.
pub fn read_csv<R: Read>(rdr: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = rdr.headers().context("failed to read CSV header")?.clone();

    let mut table = Table::new(headers.iter());
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("malformed CSV record {}", line + 1))?;
        if record.len() > headers.len() {
            bail!(
                "malformed CSV record {}: found {} fields, but the header has {}",
                line + 1,
                record.len(),
                headers.len()
            );
        }
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Null
                } else {
                    Cell::from(field)
                }
            })
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

/// Read a JSON document shaped as a list of records or as a mapping of
/// group name to list of records.
pub fn read_json<R: Read>(rdr: R) -> Result<Table> {
    let value: Value = serde_json::from_reader(rdr).context("failed to parse JSON")?;
    Ok(table_from_json(value)?)
}

/// Flatten a parsed JSON document into a table.
///
/// A mapping of lists is concatenated group by group in document order, and
/// each record is tagged with its group name in the [`GROUP_KEY_COLUMN`]
/// column, overwriting any field of the same name.
pub fn table_from_json(value: Value) -> crate::Result<Table> {
    match value {
        Value::Array(items) => {
            let records = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| into_record(item, || format!("record {}", i)))
                .collect::<crate::Result<Vec<_>>>()?;
            Ok(Table::from_records(records))
        }
        Value::Object(groups) => {
            let mut records = Vec::new();
            for (group, items) in groups {
                let Value::Array(items) = items else {
                    return Err(Error::UnsupportedJson {
                        reason: format!("group '{}' is not a list of records", group),
                    });
                };
                for (i, item) in items.into_iter().enumerate() {
                    let mut record = into_record(item, || format!("record {} of group '{}'", i, group))?;
                    record.insert(GROUP_KEY_COLUMN.to_string(), Value::String(group.clone()));
                    records.push(record);
                }
            }
            Ok(Table::from_records(records))
        }
        _ => Err(Error::UnsupportedJson {
            reason: "expected a list of records or a mapping of lists".to_string(),
        }),
    }
}

fn into_record<F>(item: Value, describe: F) -> crate::Result<serde_json::Map<String, Value>>
where
    F: FnOnce() -> String,
{
    match item {
        Value::Object(map) => Ok(map),
        _ => Err(Error::UnsupportedJson {
            reason: format!("{} is not an object", describe()),
        }),
    }
}
