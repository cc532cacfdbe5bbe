use ip_extract::Extractor;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::mmdb::GeoDatabase;
use crate::table::Cell;

/// Column names of the enrichment schema, in export order.
pub const GEO_COLUMNS: [&str; 6] = ["IP", "Country", "City", "Postal Code", "ASN", "Organization"];

/// Geolocation and AS metadata for one address.
///
/// Every field is optional. A record for an address that could not be
/// resolved has all fields `None`, including `ip`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeoRecord {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub asn: Option<u32>,
    pub organization: Option<String>,
}

impl GeoRecord {
    /// The all-missing record used to keep row alignment.
    #[inline]
    pub fn missing() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        *self == Self::default()
    }

    /// Cells in [`GEO_COLUMNS`] order.
    pub fn into_cells(self) -> Vec<Cell> {
        vec![
            self.ip.into(),
            self.country.into(),
            self.city.into(),
            self.postal_code.into(),
            self.asn.into(),
            self.organization.into(),
        ]
    }
}

/// What happened to one table row.
#[derive(Debug)]
pub enum LookupOutcome {
    /// An address was extracted and found in both databases.
    Resolved(GeoRecord),
    /// The cell was null, not a string, or held no address.
    NoAddress,
    /// An address was extracted but the lookup failed.
    Failed { ip: String, error: Error },
}

impl LookupOutcome {
    /// The address extracted from the cell, whether or not it resolved.
    pub fn address(&self) -> Option<&str> {
        match self {
            LookupOutcome::Resolved(record) => record.ip.as_deref(),
            LookupOutcome::Failed { ip, .. } => Some(ip),
            LookupOutcome::NoAddress => None,
        }
    }

    /// Collapse the outcome into a record, substituting
    /// [`GeoRecord::missing`] for anything unresolved.
    pub fn into_record(self) -> GeoRecord {
        match self {
            LookupOutcome::Resolved(record) => record,
            LookupOutcome::NoAddress | LookupOutcome::Failed { .. } => GeoRecord::missing(),
        }
    }
}

/// Attaches geolocation metadata to addresses.
///
/// Both lookup services are queried for every address. Successful lookups
/// are cached for the lifetime of the enricher.
pub struct GeoEnricher<D> {
    db: D,
    extractor: Extractor,
    cache: RefCell<FxHashMap<String, GeoRecord>>,
}

impl<D: GeoDatabase> GeoEnricher<D> {
    pub fn new(db: D, extractor: Extractor) -> Self {
        Self {
            db,
            extractor,
            cache: RefCell::new(FxHashMap::with_capacity_and_hasher(
                1024,
                Default::default(),
            )),
        }
    }

    /// The extractor used by [`GeoEnricher::lookup_row`].
    #[inline]
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Look up a single address in both databases.
    pub fn lookup(&self, ip: &str) -> Result<GeoRecord> {
        if let Some(cached) = self.cache.borrow().get(ip) {
            return Ok(cached.clone());
        }

        let addr: Ipv4Addr = ip.parse().map_err(|_| Error::InvalidAddress {
            ip: ip.to_string(),
        })?;
        let location = self.db.location(addr)?;
        let system = self.db.autonomous_system(addr)?;

        let record = GeoRecord {
            ip: Some(ip.to_string()),
            country: location.country_iso,
            city: location.city,
            postal_code: location.postal_code,
            asn: system.number,
            organization: system.organization,
        };

        self.cache
            .borrow_mut()
            .insert(ip.to_string(), record.clone());
        Ok(record)
    }

    /// Enrich a batch of addresses.
    ///
    /// Addresses that fail to resolve are logged and left out, so the result
    /// can be shorter than the input. Pass a single address as a one-element
    /// iterable, e.g. `enrich(["8.8.8.8"])`.
    pub fn enrich<I, S>(&self, addresses: I) -> Vec<GeoRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        addresses
            .into_iter()
            .filter_map(|ip| {
                let ip = ip.as_ref();
                match self.lookup(ip) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        log::warn!("Error processing {}: {}", ip, err);
                        None
                    }
                }
            })
            .collect()
    }

    /// Extract the first address from a raw cell and look it up.
    pub fn lookup_row(&self, raw: &Cell) -> LookupOutcome {
        let Some(ip) = raw.as_str().and_then(|text| self.extractor.first(text)) else {
            return LookupOutcome::NoAddress;
        };

        match self.lookup(ip) {
            Ok(record) => LookupOutcome::Resolved(record),
            Err(error) => {
                log::warn!("Error processing {}: {}", ip, error);
                LookupOutcome::Failed {
                    ip: ip.to_string(),
                    error,
                }
            }
        }
    }

    /// Row-wise enrichment that always yields exactly one record.
    #[inline]
    pub fn lookup_one(&self, raw: &Cell) -> GeoRecord {
        self.lookup_row(raw).into_record()
    }
}
