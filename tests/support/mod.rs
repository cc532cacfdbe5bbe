//! Writes small GeoLite2-shaped MaxMind DB files for tests.
//!
//! Only what the City and ASN lookups need is supported: an IPv4 search tree
//! of /32 entries with 24-bit records, and maps, strings, arrays and
//! unsigned integers in the data section.
#![allow(dead_code)]

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

const METADATA_MARKER: &[u8] = b"\xab\xcd\xefMaxMind.com";
const DATA_SECTION_SEPARATOR: [u8; 16] = [0; 16];

pub const CITY_DB: &str = "GeoLite2-City.mmdb";
pub const ASN_DB: &str = "GeoLite2-ASN.mmdb";

/// A value in the MaxMind DB data section.
pub enum Value<'a> {
    Str(&'a str),
    U16(u16),
    U32(u32),
    U64(u64),
    Array(Vec<Value<'a>>),
    Map(Vec<(&'a str, Value<'a>)>),
}

impl Value<'_> {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Value::Str(s) => {
                control(out, 2, s.len());
                out.extend_from_slice(s.as_bytes());
            }
            Value::U16(n) => unsigned(out, 5, &n.to_be_bytes()),
            Value::U32(n) => unsigned(out, 6, &n.to_be_bytes()),
            Value::U64(n) => unsigned(out, 9, &n.to_be_bytes()),
            Value::Array(items) => {
                control(out, 11, items.len());
                for item in items {
                    item.encode(out);
                }
            }
            Value::Map(entries) => {
                control(out, 7, entries.len());
                for (key, value) in entries {
                    Value::Str(key).encode(out);
                    value.encode(out);
                }
            }
        }
    }
}

/// Control byte: type in the top three bits, size in the low five. Types
/// above 7 are extended and carry `type - 7` in the following byte.
fn control(out: &mut Vec<u8>, type_num: u8, size: usize) {
    let (first, extended) = if type_num > 7 {
        (0u8, Some(type_num - 7))
    } else {
        (type_num << 5, None)
    };
    let (size_bits, size_extra) = match size {
        0..=28 => (size as u8, None),
        29..=284 => (29, Some((size - 29) as u8)),
        _ => panic!("value too large for test database: {}", size),
    };
    out.push(first | size_bits);
    out.extend(extended);
    out.extend(size_extra);
}

fn unsigned(out: &mut Vec<u8>, type_num: u8, be_bytes: &[u8]) {
    let skip = be_bytes.iter().take_while(|b| **b == 0).count();
    let bytes = &be_bytes[skip..];
    control(out, type_num, bytes.len());
    out.extend_from_slice(bytes);
}

#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Node(usize),
    Data(usize),
}

/// An IPv4 database of exact-address entries.
pub struct MmdbBuilder {
    database_type: String,
    nodes: Vec<[Slot; 2]>,
    data: Vec<u8>,
}

impl MmdbBuilder {
    pub fn new(database_type: &str) -> Self {
        Self {
            database_type: database_type.to_string(),
            nodes: vec![[Slot::Empty, Slot::Empty]],
            data: Vec::new(),
        }
    }

    pub fn insert(&mut self, ip: Ipv4Addr, record: &Value) -> &mut Self {
        let offset = self.data.len();
        record.encode(&mut self.data);

        let bits = u32::from(ip);
        let mut node = 0;
        for depth in 0..32 {
            let bit = ((bits >> (31 - depth)) & 1) as usize;
            if depth == 31 {
                self.nodes[node][bit] = Slot::Data(offset);
                break;
            }
            node = match self.nodes[node][bit] {
                Slot::Node(next) => next,
                _ => {
                    self.nodes.push([Slot::Empty, Slot::Empty]);
                    let next = self.nodes.len() - 1;
                    self.nodes[node][bit] = Slot::Node(next);
                    next
                }
            };
        }
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let node_count = self.nodes.len();
        let record = |slot: Slot| -> u32 {
            let value = match slot {
                Slot::Empty => node_count,
                Slot::Node(n) => n,
                Slot::Data(offset) => node_count + DATA_SECTION_SEPARATOR.len() + offset,
            };
            u32::try_from(value).expect("record fits in 24 bits")
        };

        let mut out = Vec::with_capacity(node_count * 6 + self.data.len() + 256);
        for [left, right] in &self.nodes {
            out.extend_from_slice(&record(*left).to_be_bytes()[1..]);
            out.extend_from_slice(&record(*right).to_be_bytes()[1..]);
        }
        out.extend_from_slice(&DATA_SECTION_SEPARATOR);
        out.extend_from_slice(&self.data);

        out.extend_from_slice(METADATA_MARKER);
        Value::Map(vec![
            ("binary_format_major_version", Value::U16(2)),
            ("binary_format_minor_version", Value::U16(0)),
            ("build_epoch", Value::U64(1_700_000_000)),
            ("database_type", Value::Str(&self.database_type)),
            (
                "description",
                Value::Map(vec![("en", Value::Str("geolook test database"))]),
            ),
            ("ip_version", Value::U16(4)),
            ("languages", Value::Array(vec![Value::Str("en")])),
            ("node_count", Value::U32(node_count as u32)),
            ("record_size", Value::U16(24)),
        ])
        .encode(&mut out);
        out
    }

    pub fn write(&self, path: &Path) {
        fs::write(path, self.to_bytes()).expect("write test database");
    }
}

fn city<'a>(iso_code: &'a str, city: Option<&'a str>, postal: Option<&'a str>) -> Value<'a> {
    let mut entries = vec![(
        "country",
        Value::Map(vec![
            ("iso_code", Value::Str(iso_code)),
            ("names", Value::Map(vec![("en", Value::Str("Test Country"))])),
        ]),
    )];
    if let Some(name) = city {
        entries.push((
            "city",
            Value::Map(vec![
                ("geoname_id", Value::U32(2_643_743)),
                (
                    "names",
                    Value::Map(vec![("en", Value::Str(name)), ("de", Value::Str(name))]),
                ),
            ]),
        ));
    }
    if let Some(code) = postal {
        entries.push(("postal", Value::Map(vec![("code", Value::Str(code))])));
    }
    Value::Map(entries)
}

fn asn(number: u32, organization: &str) -> Value<'_> {
    Value::Map(vec![
        ("autonomous_system_number", Value::U32(number)),
        ("autonomous_system_organization", Value::Str(organization)),
    ])
}

/// Write `GeoLite2-City.mmdb` and `GeoLite2-ASN.mmdb` into `dir`.
///
/// - `81.2.69.142`: GB, London, SW1A, AS20712 Andrews & Arnold Ltd
/// - `89.160.20.112`: SE, Linköping, no postal code, AS29518 Bredband2 AB
/// - `1.128.0.1`: only in the ASN database, AS1221 Telstra Pty Ltd
pub fn write_geolite_fixtures(dir: &Path) {
    MmdbBuilder::new("GeoLite2-City")
        .insert("81.2.69.142".parse().unwrap(), &city("GB", Some("London"), Some("SW1A")))
        .insert("89.160.20.112".parse().unwrap(), &city("SE", Some("Linköping"), None))
        .write(&dir.join(CITY_DB));

    MmdbBuilder::new("GeoLite2-ASN")
        .insert("81.2.69.142".parse().unwrap(), &asn(20712, "Andrews & Arnold Ltd"))
        .insert("89.160.20.112".parse().unwrap(), &asn(29518, "Bredband2 AB"))
        .insert("1.128.0.1".parse().unwrap(), &asn(1221, "Telstra Pty Ltd"))
        .write(&dir.join(ASN_DB));
}
