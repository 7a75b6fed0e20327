//! Reference prefix sets for exchange peering LANs
//!
//! A reference prefix is either a CIDR block (`187.16.216.0/21`) or, for
//! captures whose columns do not hold clean addresses, a literal text
//! prefix that the network column is compared against.

use ipnet::IpNet;
use std::net::IpAddr;

/// One entry of a reference prefix set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferencePrefix {
    /// Address block of the peering LAN
    Net(IpNet),
    /// Literal leading text of the column
    Text(String),
}

impl ReferencePrefix {
    /// Parse a configured prefix; anything that is not CIDR is literal text
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<IpNet>() {
            Ok(net) => ReferencePrefix::Net(net),
            Err(_) => ReferencePrefix::Text(s.to_string()),
        }
    }

    /// Check whether a network-column field falls under this prefix
    pub fn matches(&self, field: &str) -> bool {
        match self {
            ReferencePrefix::Net(net) => {
                if let Ok(addr) = field.parse::<IpAddr>() {
                    net.contains(&addr)
                } else if let Ok(other) = field.parse::<IpNet>() {
                    net.contains(&other)
                } else {
                    false
                }
            }
            ReferencePrefix::Text(text) => !text.is_empty() && field.starts_with(text.as_str()),
        }
    }
}

/// Per-exchange set of peering LAN prefixes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePrefixSet {
    prefixes: Vec<ReferencePrefix>,
}

impl ReferencePrefixSet {
    /// An empty set; the continuation heuristic is unavailable with it
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from configured strings, ignoring blanks
    pub fn from_strings<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .filter(|p| !p.as_ref().trim().is_empty())
                .map(|p| ReferencePrefix::parse(p.as_ref()))
                .collect(),
        }
    }

    /// Whether the set has no prefixes
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Number of prefixes in the set
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// True when `field` matches none of the reference prefixes
    pub fn is_authoritative(&self, field: &str) -> bool {
        !self.prefixes.iter().any(|p| p.matches(field))
    }
}
