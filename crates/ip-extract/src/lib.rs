//! IPv4 address extraction from noisy text.
//!
//! `ip-extract` finds dotted-quad IPv4 literals inside arbitrary text such as
//! log lines or free-form spreadsheet cells. Candidates are located with a
//! single regex scan; what happens to each candidate depends on the
//! [`MatchMode`] the [`Extractor`] was built with:
//!
//! - [`MatchMode::Loose`] accepts every dotted quad of 1-3 digit segments,
//!   without checking that the octets are in range.
//! - [`MatchMode::Validated`] accepts only candidates that parse as an IPv4
//!   address and skips the rest.
//!
//! ## Quick Start
//!
//! ```
//! use ip_extract::{ExtractorBuilder, MatchMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let extractor = ExtractorBuilder::new().mode(MatchMode::Validated).build()?;
//!
//! assert_eq!(extractor.first("300.1.1.1 then 10.0.0.7"), Some("10.0.0.7"));
//! assert_eq!(extractor.all("a 1.1.1.1 b 8.8.8.8"), vec!["1.1.1.1", "8.8.8.8"]);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::ops::Range;

use regex_automata::meta::Regex;
use regex_syntax::hir::Hir;

/// Dotted quad bounded by Unicode word boundaries, so `1.2.3.4` is found in
/// `src=1.2.3.4,` but not inside `a1.2.3.4` or `é1.2.3.4`.
static IPV4_PATTERN: &str = r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b";

/// How strictly regex candidates are checked before they are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Report every dotted quad, including out-of-range ones like `300.1.1.1`.
    #[default]
    Loose,
    /// Report only candidates that are legal IPv4 literals.
    Validated,
}

impl MatchMode {
    #[inline(always)]
    fn accepts(self, candidate: &[u8]) -> bool {
        match self {
            MatchMode::Loose => true,
            MatchMode::Validated => parse_ipv4_bytes(candidate).is_some(),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Loose => write!(f, "loose"),
            MatchMode::Validated => write!(f, "validated"),
        }
    }
}

/// A searcher for IPv4 addresses in text.
///
/// Extractors are built with [`ExtractorBuilder`] and are meant to be reused
/// for every cell of a table; the regex is compiled once.
#[derive(Clone)]
pub struct Extractor {
    regex: Regex,
    mode: MatchMode,
}

impl Extractor {
    /// Return an iterator of byte ranges for every accepted address in the
    /// haystack, in order of appearance.
    ///
    /// Ranges are always valid indices into `haystack`.
    #[inline]
    pub fn find_iter<'a>(&'a self, haystack: &'a [u8]) -> impl Iterator<Item = Range<usize>> + 'a {
        let mode = self.mode;
        self.regex
            .find_iter(haystack)
            .map(|m| m.range())
            .filter(move |range| mode.accepts(&haystack[range.clone()]))
    }

    /// Return the first accepted address in `text`, if any.
    ///
    /// In loose mode this is simply the first dotted quad. In validated mode
    /// invalid candidates are skipped, so a later valid address can win.
    #[inline]
    pub fn first<'h>(&self, text: &'h str) -> Option<&'h str> {
        self.find_iter(text.as_bytes())
            .next()
            .map(|range| &text[range])
    }

    /// Return every accepted address in `text`, in order of appearance.
    pub fn all<'h>(&self, text: &'h str) -> Vec<&'h str> {
        self.find_iter(text.as_bytes())
            .map(|range| &text[range])
            .collect()
    }

    /// The mode this extractor was built with.
    #[inline]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("mode", &self.mode)
            .finish()
    }
}

/// Builder for constructing an [`Extractor`].
#[derive(Clone, Debug, Default)]
pub struct ExtractorBuilder {
    mode: MatchMode,
}

impl ExtractorBuilder {
    /// Create a new builder in [`MatchMode::Loose`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the match mode.
    #[inline(always)]
    pub fn mode(&mut self, mode: MatchMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(MatchMode::Loose)`.
    #[inline(always)]
    pub fn loose(&mut self) -> &mut Self {
        self.mode(MatchMode::Loose)
    }

    /// Shorthand for `mode(MatchMode::Validated)`.
    #[inline(always)]
    pub fn validated(&mut self) -> &mut Self {
        self.mode(MatchMode::Validated)
    }

    /// Build the extractor with the current settings.
    pub fn build(&self) -> anyhow::Result<Extractor> {
        let hir: Hir = regex_syntax::Parser::new().parse(IPV4_PATTERN)?;

        let regex = Regex::builder()
            .configure(
                Regex::config()
                    .auto_prefilter(true)
                    .match_kind(regex_automata::MatchKind::LeftmostFirst),
            )
            .build_from_hir(&hir)?;

        Ok(Extractor {
            regex,
            mode: self.mode,
        })
    }
}

/// Parse an IPv4 address from raw bytes.
///
/// Stricter than a plain dotted-quad match: every octet must be in `0..=255`
/// and must not carry a leading zero.
///
/// ```
/// use ip_extract::parse_ipv4_bytes;
///
/// assert_eq!(parse_ipv4_bytes(b"192.168.1.1"), Some("192.168.1.1".parse().unwrap()));
/// assert_eq!(parse_ipv4_bytes(b"256.1.1.1"), None);
/// assert_eq!(parse_ipv4_bytes(b"192.168.01.1"), None);
/// ```
#[inline]
pub fn parse_ipv4_bytes(bytes: &[u8]) -> Option<Ipv4Addr> {
    if bytes.len() < 7 || bytes.len() > 15 {
        return None;
    }
    let mut octets = [0u8; 4];
    let mut octet_idx = 0;
    let mut current_val = 0u16;
    let mut digits_in_octet = 0;
    for &b in bytes {
        match b {
            b'.' => {
                if digits_in_octet == 0 || octet_idx == 3 {
                    return None;
                }
                octets[octet_idx] = current_val as u8;
                octet_idx += 1;
                current_val = 0;
                digits_in_octet = 0;
            }
            b'0'..=b'9' => {
                if digits_in_octet > 0 && current_val == 0 {
                    return None;
                }
                current_val = current_val * 10 + (b - b'0') as u16;
                if current_val > 255 {
                    return None;
                }
                digits_in_octet += 1;
            }
            _ => return None,
        }
    }
    if octet_idx != 3 || digits_in_octet == 0 {
        return None;
    }
    octets[3] = current_val as u8;
    Some(Ipv4Addr::from(octets))
}
