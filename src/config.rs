//! Database path configuration.
//!
//! The directory holding the MaxMind databases is remembered between runs in
//! a small JSON file. When the file is missing, or names a directory that no
//! longer exists, a [`DbPathProvider`] is asked once and the answer saved.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

use crate::error::Error;

/// Default location of the configuration file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_FILE: &str = "geolook.json";

/// Resolved runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the City and ASN databases
    pub db_path: Utf8PathBuf,
}

impl Config {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Stored {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    db_path: Option<Utf8PathBuf>,
}

/// The on-disk configuration file.
#[derive(Clone, Debug)]
pub struct ConfigFile {
    path: Utf8PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The stored database path, if the file exists and has one.
    pub fn load(&self) -> Result<Option<Utf8PathBuf>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read config file: {}", self.path))?;
        let stored: Stored = serde_json::from_str(&text)
            .with_context(|| format!("malformed config file: {}", self.path))?;
        Ok(stored.db_path)
    }

    /// Persist `db_path`, replacing any previous contents.
    pub fn save(&self, db_path: &Utf8Path) -> Result<()> {
        let stored = Stored {
            db_path: Some(db_path.to_path_buf()),
        };
        let text = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("failed to write config file: {}", self.path))?;
        log::info!("saved database path {} to {}", db_path, self.path);
        Ok(())
    }

    /// Use the stored path when it names an existing directory, otherwise
    /// ask `provider` and remember the answer.
    pub fn resolve(&self, provider: &mut dyn DbPathProvider) -> Result<Config> {
        let reason = match self.load()? {
            Some(path) if path.is_dir() => {
                log::debug!("using database path {} from {}", path, self.path);
                return Ok(Config::new(path));
            }
            Some(path) => format!(
                "The database path {} in {} does not exist.",
                path, self.path
            ),
            None => format!("No database path found in {}.", self.path),
        };

        let db_path = provider.provide(&reason)?;
        self.save(&db_path)?;
        Ok(Config::new(db_path))
    }
}

/// Supplies a database directory when none is configured.
pub trait DbPathProvider {
    /// `reason` says why the path is being asked for.
    fn provide(&mut self, reason: &str) -> crate::Result<Utf8PathBuf>;
}

/// Asks for the path on a terminal.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stderr> {
    /// Read the answer from stdin, writing the question to stderr.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> DbPathProvider for Prompt<R, W> {
    fn provide(&mut self, reason: &str) -> crate::Result<Utf8PathBuf> {
        let mut answer = String::new();
        // a broken terminal is treated the same as no answer
        let asked = write!(
            self.output,
            "{} Please enter the path to the database files: ",
            reason
        )
        .and_then(|_| self.output.flush())
        .and_then(|_| self.input.read_line(&mut answer));

        match asked {
            Ok(_) if !answer.trim().is_empty() => Ok(Utf8PathBuf::from(answer.trim())),
            _ => Err(Error::MissingDbPath),
        }
    }
}

/// Always answers with the same path.
#[derive(Clone, Debug)]
pub struct FixedPath(pub Utf8PathBuf);

impl DbPathProvider for FixedPath {
    fn provide(&mut self, _reason: &str) -> crate::Result<Utf8PathBuf> {
        Ok(self.0.clone())
    }
}
