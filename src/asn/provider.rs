//! Country provider abstraction
//!
//! Every data source that can map an ASN to countries implements
//! [`CountryProvider`]. The resolver walks an ordered list of them and the
//! first one returning a non-empty [`CountrySet`] wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Provenance of an attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Local RIR delegated-stats extracts
    Whois,
    /// Local CC2ASN dataset
    Cc2asn,
    /// Team Cymru DNS service
    Cymru,
    /// ipinfo.io AS page
    Ipinfo,
    /// No provider knew the ASN
    None,
}

impl Source {
    /// Lowercase tag used in output files
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Whois => "whois",
            Source::Cc2asn => "cc2asn",
            Source::Cymru => "cymru",
            Source::Ipinfo => "ipinfo",
            Source::None => "none",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regional Internet Registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
    /// AFRINIC
    Afrinic,
    /// APNIC
    Apnic,
    /// ARIN
    Arin,
    /// IANA
    Iana,
    /// LACNIC
    Lacnic,
    /// RIPE NCC
    #[serde(rename = "ripencc")]
    RipeNcc,
}

impl Registry {
    /// Registry name as written in delegated-stats files
    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Afrinic => "afrinic",
            Registry::Apnic => "apnic",
            Registry::Arin => "arin",
            Registry::Iana => "iana",
            Registry::Lacnic => "lacnic",
            Registry::RipeNcc => "ripencc",
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Registry {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "afrinic" => Ok(Registry::Afrinic),
            "apnic" => Ok(Registry::Apnic),
            "arin" => Ok(Registry::Arin),
            "iana" => Ok(Registry::Iana),
            "lacnic" => Ok(Registry::Lacnic),
            "ripencc" | "ripe" => Ok(Registry::RipeNcc),
            _ => Err(LookupError::InvalidFormat),
        }
    }
}

/// Countries (and, for registry data, registries) a provider found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountrySet {
    /// Lowercase country codes
    pub codes: BTreeSet<String>,
    /// Registries whose records matched
    pub registries: BTreeSet<Registry>,
}

impl CountrySet {
    /// Build a set from raw codes, lowercasing and dropping blanks
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for code in codes {
            set.insert_code(code.as_ref());
        }
        set
    }

    /// Add one raw country code
    pub fn insert_code(&mut self, code: &str) {
        let code = code.trim();
        if !code.is_empty() {
            self.codes.insert(code.to_ascii_lowercase());
        }
    }

    /// Whether no country was found
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Error type for provider lookups
///
/// These never leave the resolver; a failed lookup is an empty result.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Invalid response format
    #[error("Invalid response format")]
    InvalidFormat,

    /// The service answered with its "no data" sentinel
    #[error("No data for ASN")]
    NotFound,
}

/// A source of ASN to country attributions
#[async_trait]
pub trait CountryProvider: Send + Sync {
    /// Provenance tag recorded when this provider wins
    fn source(&self) -> Source;

    /// Whether lookups leave the host and are subject to rate limits
    fn is_live(&self) -> bool {
        false
    }

    /// Look up the countries of a numeric ASN
    ///
    /// `None` and an empty set both mean "not found here".
    async fn resolve(&self, asn: u32) -> Option<CountrySet>;
}
