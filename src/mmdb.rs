use std::net::{IpAddr, Ipv4Addr};

use camino::Utf8Path;
use maxminddb::{geoip2, Reader};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

// Database files expected inside the configured directory
pub const ASN_DB_FILENAME: &str = "GeoLite2-ASN.mmdb";
pub const CITY_DB_FILENAME: &str = "GeoLite2-City.mmdb";

/// Location metadata from the city database.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    /// ISO 3166-1 alpha-2 country code
    pub country_iso: Option<String>,
    /// English city name
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Autonomous system metadata from the ASN database.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsInfo {
    pub number: Option<u32>,
    pub organization: Option<String>,
}

/// An offline IP metadata source with two independent lookup services.
///
/// Absence of an address, or undecodable data, is reported as an error the
/// caller handles per lookup.
pub trait GeoDatabase {
    /// Look up country, city and postal code.
    fn location(&self, ip: Ipv4Addr) -> Result<Location>;

    /// Look up the autonomous system number and organization.
    fn autonomous_system(&self, ip: Ipv4Addr) -> Result<AsInfo>;
}

impl<D: GeoDatabase + ?Sized> GeoDatabase for &D {
    fn location(&self, ip: Ipv4Addr) -> Result<Location> {
        (**self).location(ip)
    }

    fn autonomous_system(&self, ip: Ipv4Addr) -> Result<AsInfo> {
        (**self).autonomous_system(ip)
    }
}

/// MaxMind GeoLite2 City and ASN databases.
pub struct MaxMindDb {
    city_reader: Reader<Vec<u8>>,
    asn_reader: Reader<Vec<u8>>,
}

impl std::fmt::Debug for MaxMindDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxMindDb")
            .field("city", &self.city_reader.metadata.database_type)
            .field("asn", &self.asn_reader.metadata.database_type)
            .finish()
    }
}

impl MaxMindDb {
    /// Open both databases from `dir`.
    pub fn open(dir: &Utf8Path) -> Result<Self> {
        let city_reader = open_reader(dir, CITY_DB_FILENAME)?;
        let asn_reader = open_reader(dir, ASN_DB_FILENAME)?;
        log::debug!(
            "opened {} ({}) and {} ({}) in {}",
            CITY_DB_FILENAME,
            city_reader.metadata.database_type,
            ASN_DB_FILENAME,
            asn_reader.metadata.database_type,
            dir
        );

        Ok(Self {
            city_reader,
            asn_reader,
        })
    }
}

fn open_reader(dir: &Utf8Path, filename: &str) -> Result<Reader<Vec<u8>>> {
    let path = dir.join(filename);
    if !path.is_file() {
        return Err(Error::DatabaseNotFound { path });
    }
    Reader::open_readfile(&path).map_err(|source| Error::OpenDatabase { path, source })
}

impl GeoDatabase for MaxMindDb {
    fn location(&self, ip: Ipv4Addr) -> Result<Location> {
        let lookup = self
            .city_reader
            .lookup(IpAddr::V4(ip))
            .map_err(|source| Error::LookupFailed {
                ip: ip.to_string(),
                source,
            })?;

        let not_found = || Error::AddressNotFound {
            ip: ip.to_string(),
            database: CITY_DB_FILENAME,
        };
        if !lookup.has_data() {
            return Err(not_found());
        }

        let record: geoip2::City = lookup
            .decode()
            .map_err(|source| Error::LookupFailed {
                ip: ip.to_string(),
                source,
            })?
            .ok_or_else(not_found)?;

        // City names are hard coded to English
        Ok(Location {
            country_iso: record.country.iso_code.map(str::to_string),
            city: record.city.names.english.map(str::to_string),
            postal_code: record.postal.code.map(str::to_string),
        })
    }

    fn autonomous_system(&self, ip: Ipv4Addr) -> Result<AsInfo> {
        let lookup = self
            .asn_reader
            .lookup(IpAddr::V4(ip))
            .map_err(|source| Error::LookupFailed {
                ip: ip.to_string(),
                source,
            })?;

        let not_found = || Error::AddressNotFound {
            ip: ip.to_string(),
            database: ASN_DB_FILENAME,
        };
        if !lookup.has_data() {
            return Err(not_found());
        }

        let record: geoip2::Asn = lookup
            .decode()
            .map_err(|source| Error::LookupFailed {
                ip: ip.to_string(),
                source,
            })?
            .ok_or_else(not_found)?;

        Ok(AsInfo {
            number: record.autonomous_system_number,
            organization: record.autonomous_system_organization.map(str::to_string),
        })
    }
}

/// A fixed, in-memory database.
///
/// Addresses are looked up exactly; there is no prefix matching. Useful when
/// the real databases are not available, e.g. in tests and benchmarks.
#[derive(Clone, Debug, Default)]
pub struct StaticDb {
    locations: FxHashMap<Ipv4Addr, Location>,
    systems: FxHashMap<Ipv4Addr, AsInfo>,
}

impl StaticDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location record.
    #[must_use]
    pub fn with_location(mut self, ip: Ipv4Addr, location: Location) -> Self {
        self.locations.insert(ip, location);
        self
    }

    /// Add an autonomous system record.
    #[must_use]
    pub fn with_asn(mut self, ip: Ipv4Addr, info: AsInfo) -> Self {
        self.systems.insert(ip, info);
        self
    }

    /// Add both records for an address in one go.
    #[must_use]
    pub fn with_entry(
        self,
        ip: Ipv4Addr,
        country_iso: &str,
        city: &str,
        postal_code: &str,
        asn: u32,
        organization: &str,
    ) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        self.with_location(
            ip,
            Location {
                country_iso: non_empty(country_iso),
                city: non_empty(city),
                postal_code: non_empty(postal_code),
            },
        )
        .with_asn(
            ip,
            AsInfo {
                number: Some(asn),
                organization: non_empty(organization),
            },
        )
    }
}

impl GeoDatabase for StaticDb {
    fn location(&self, ip: Ipv4Addr) -> Result<Location> {
        self.locations
            .get(&ip)
            .cloned()
            .ok_or_else(|| Error::AddressNotFound {
                ip: ip.to_string(),
                database: CITY_DB_FILENAME,
            })
    }

    fn autonomous_system(&self, ip: Ipv4Addr) -> Result<AsInfo> {
        self.systems
            .get(&ip)
            .cloned()
            .ok_or_else(|| Error::AddressNotFound {
                ip: ip.to_string(),
                database: ASN_DB_FILENAME,
            })
    }
}
