//! Output views and CSV export.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use std::fmt;
use std::io::Write;

use crate::geoip::{GeoEnricher, GEO_COLUMNS};
use crate::mmdb::GeoDatabase;
use crate::table::{Cell, Table};

/// Timestamp layout used in exported file names.
pub const TIMESTAMP_FORMAT: &str = "%y%m%d_%H%M%S";

/// The three export shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum ViewKind {
    /// Extracted addresses only
    #[value(name = "i", alias = "addresses")]
    Addresses,
    /// Enrichment columns only
    #[value(name = "g", alias = "geo")]
    Geo,
    /// Input columns followed by the enrichment columns
    #[value(name = "c", alias = "combined")]
    Combined,
}

impl ViewKind {
    /// The file name component for this view.
    pub fn suffix(self) -> &'static str {
        match self {
            ViewKind::Addresses => "ip_addresses",
            ViewKind::Geo => "geo",
            ViewKind::Combined => "combined",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// The three derived tables, each row-aligned with the source table.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputViews {
    pub addresses: Table,
    pub geo: Table,
    pub combined: Table,
}

impl OutputViews {
    /// Extract and enrich every row of `table` from the cells of `column`.
    pub fn build<D: GeoDatabase>(
        table: &Table,
        column: &str,
        enricher: &GeoEnricher<D>,
    ) -> crate::Result<Self> {
        let idx = table.require_column(column)?;

        let mut addresses = Table::new([column]);
        let mut geo = Table::new(GEO_COLUMNS);
        let mut resolved = 0usize;

        for row in table.rows() {
            let outcome = enricher.lookup_row(&row[idx]);
            addresses.push_row(vec![Cell::from(outcome.address())]);

            let record = outcome.into_record();
            if !record.is_missing() {
                resolved += 1;
            }
            geo.push_row(record.into_cells());
        }

        log::info!(
            "enriched {} of {} rows from column {}",
            resolved,
            table.len(),
            column
        );

        let combined = table.hconcat(&geo);
        Ok(Self {
            addresses,
            geo,
            combined,
        })
    }

    pub fn get(&self, kind: ViewKind) -> &Table {
        match kind {
            ViewKind::Addresses => &self.addresses,
            ViewKind::Geo => &self.geo,
            ViewKind::Combined => &self.combined,
        }
    }
}

/// Writes views next to each other under one run timestamp.
#[derive(Clone, Debug)]
pub struct Exporter {
    stem: String,
    output_dir: Option<Utf8PathBuf>,
    timestamp: String,
}

impl Exporter {
    /// Name exports after `source`'s file stem, stamped with the current
    /// local time.
    pub fn new(source: &Utf8Path, output_dir: Option<&Utf8Path>) -> Self {
        Self::at(source, output_dir, Local::now())
    }

    pub fn at(source: &Utf8Path, output_dir: Option<&Utf8Path>, now: DateTime<Local>) -> Self {
        Self {
            stem: source.file_stem().unwrap_or("export").to_string(),
            output_dir: output_dir.map(Utf8Path::to_path_buf),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// `{stem}_{suffix}_{timestamp}.csv`, inside the output directory if set.
    pub fn path_for(&self, kind: ViewKind) -> Utf8PathBuf {
        let name = format!("{}_{}_{}.csv", self.stem, kind.suffix(), self.timestamp);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => Utf8PathBuf::from(name),
        }
    }

    /// Write one view to its file and return the path written.
    pub fn export(&self, kind: ViewKind, view: &Table) -> Result<Utf8PathBuf> {
        let path = self.path_for(kind);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path))?;
        write_csv(view, file).with_context(|| format!("Failed to write {}", path))?;
        log::debug!("wrote {} rows to {}", view.len(), path);
        Ok(path)
    }
}

/// Write a table as CSV with a header row. Nulls become empty fields.
pub fn write_csv<W: Write>(table: &Table, wtr: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
