//! One batch run from input file to exported views.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ip_extract::{ExtractorBuilder, MatchMode};
use std::io::Write;
use termcolor::{BufferedStandardStream, ColorChoice, WriteColor};

use crate::config::Config;
use crate::export::{Exporter, OutputViews, ViewKind};
use crate::filter::{self, FilterCriteria};
use crate::geoip::GeoEnricher;
use crate::input::{self, SourceFormat};
use crate::mmdb::{GeoDatabase, MaxMindDb};
use crate::preview;

/// Everything requested for one run.
#[derive(Clone, Debug, Default)]
pub struct Job {
    pub input: Utf8PathBuf,
    /// Column holding the addresses. Without it the run stops after the
    /// preview.
    pub ip_column: Option<String>,
    /// Views to write, in order. Repeats are written once.
    pub exports: Vec<ViewKind>,
    pub output_dir: Option<Utf8PathBuf>,
    pub filter_column: Option<String>,
    pub filter_value: Option<String>,
    pub match_mode: MatchMode,
}

impl Job {
    pub fn new(input: impl Into<Utf8PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }
}

/// How a run ended, when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The input extension is neither csv nor json.
    UnsupportedInput { path: Utf8PathBuf },
    /// No IP column was named, so nothing was enriched.
    NoIpColumn,
    /// Every row was enriched and the requested views written.
    Completed {
        rows: usize,
        exported: Vec<Utf8PathBuf>,
    },
}

#[derive(Clone, Debug)]
pub struct Pipeline {
    config: Config,
    color: ColorChoice,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            color: ColorChoice::Never,
        }
    }

    /// Colour used for tables printed to stdout.
    #[must_use]
    pub fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run against the MaxMind databases, reporting to stdout.
    pub fn run(&self, job: &Job) -> Result<RunOutcome> {
        let mut out = BufferedStandardStream::stdout(self.color);
        let outcome = self.run_with(job, |dir| MaxMindDb::open(dir), &mut out);
        out.flush()?;
        outcome
    }

    /// Run with a custom database opener and output stream.
    ///
    /// `open` is only called once the input has loaded and an IP column was
    /// named.
    pub fn run_with<D, F, W>(&self, job: &Job, open: F, out: &mut W) -> Result<RunOutcome>
    where
        D: GeoDatabase,
        F: FnOnce(&Utf8Path) -> crate::Result<D>,
        W: WriteColor,
    {
        let Some(format) = SourceFormat::from_path(&job.input) else {
            writeln!(out, "Unsupported file type: {}", job.input)?;
            return Ok(RunOutcome::UnsupportedInput {
                path: job.input.clone(),
            });
        };

        let mut table = input::load(&job.input, format)?;

        match FilterCriteria::from_options(job.filter_column.as_deref(), job.filter_value.as_deref())
        {
            FilterCriteria::Apply { column, value } => {
                table = filter::apply(table, &column, &value)
                    .with_context(|| format!("failed to filter on column {}", column))?;
                preview::render_table(&table, out)?;
            }
            FilterCriteria::MissingValue { column } => {
                writeln!(
                    out,
                    "No filter data provided for column {}, proceeding without filters.",
                    column
                )?;
            }
            FilterCriteria::MissingColumn { value } => {
                writeln!(
                    out,
                    "No filter column provided for data {}, proceeding without filters.",
                    value
                )?;
            }
            FilterCriteria::None => preview::render_preview(&table, out)?,
        }

        let Some(ip_column) = job.ip_column.as_deref() else {
            writeln!(
                out,
                "GeoIP lookups and exports require an IP column (-c). Exiting."
            )?;
            return Ok(RunOutcome::NoIpColumn);
        };
        // fail on a bad column name before touching the databases
        table.require_column(ip_column)?;

        let db = open(&self.config.db_path)
            .with_context(|| format!("failed to open databases in {}", self.config.db_path))?;
        let extractor = ExtractorBuilder::new().mode(job.match_mode).build()?;
        log::debug!("extracting addresses in {} mode", extractor.mode());
        let enricher = GeoEnricher::new(db, extractor);

        let views = OutputViews::build(&table, ip_column, &enricher)?;

        let exporter = Exporter::new(&job.input, job.output_dir.as_deref());
        let mut exported = Vec::new();
        for kind in unique(&job.exports) {
            let path = exporter.export(kind, views.get(kind))?;
            writeln!(out, "Exported {} view to {}", kind, path)?;
            exported.push(path);
        }
        if exported.is_empty() {
            log::info!("no exports requested");
        }

        Ok(RunOutcome::Completed {
            rows: table.len(),
            exported,
        })
    }
}

/// First occurrence of each kind, in request order.
fn unique(kinds: &[ViewKind]) -> Vec<ViewKind> {
    let mut seen = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        if !seen.contains(&kind) {
            seen.push(kind);
        }
    }
    seen
}
