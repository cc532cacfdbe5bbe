//! The geolook library for enriching tabular data with IP geolocation.
//!
//! Records are loaded from CSV or JSON, the first IPv4 address in a chosen
//! column is extracted from each row, and the address is looked up in the
//! offline MaxMind GeoLite2 City and ASN databases. The result can be
//! exported as three row-aligned views: the extracted addresses, the
//! geolocation records, or the input columns combined with the records.
//!
//! # Examples
//!
//! Enriching addresses against an in-memory database:
//!
//! ```rust
//! use geolook::{ExtractorBuilder, GeoEnricher, StaticDb};
//!
//! let db = StaticDb::new().with_entry(
//!     "8.8.8.8".parse().unwrap(),
//!     "US",
//!     "",
//!     "",
//!     15169,
//!     "GOOGLE",
//! );
//! let enricher = GeoEnricher::new(db, ExtractorBuilder::new().build().unwrap());
//!
//! let records = enricher.enrich(["8.8.8.8", "10.0.0.1"]);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].asn, Some(15169));
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod geoip;
pub mod input;
pub mod logging;
pub mod mmdb;
pub mod pipeline;
pub mod preview;
pub mod table;

pub use crate::config::{Config, ConfigFile, DbPathProvider, FixedPath, Prompt};
pub use crate::error::{Error, Result};
pub use crate::export::{OutputViews, ViewKind};
pub use crate::geoip::{GeoEnricher, GeoRecord, LookupOutcome, GEO_COLUMNS};
pub use crate::mmdb::{GeoDatabase, MaxMindDb, StaticDb};
pub use crate::pipeline::{Job, Pipeline, RunOutcome};
pub use crate::table::{Cell, Table};
pub use ip_extract::{Extractor, ExtractorBuilder, MatchMode};
