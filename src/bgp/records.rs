//! Record types produced by BGP table reconstruction

use serde::{Deserialize, Serialize};

/// Origin attribute of a BGP table row
///
/// Routers print an AS-set origin (as carried in ROAs) as `{64500,64501}`;
/// braces are stripped before the attribute is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginAttribute {
    /// A single origin AS token
    Single(String),
    /// A non-empty set of origin AS tokens
    RoaSet(Vec<String>),
}

impl OriginAttribute {
    /// Build an attribute from a raw table token
    ///
    /// Returns `None` when nothing is left after stripping braces.
    pub fn from_token(token: &str) -> Option<Self> {
        let stripped = token.trim_matches(|c| c == '{' || c == '}').trim();
        if stripped.is_empty() {
            return None;
        }

        if stripped.contains(',') {
            let members: Vec<String> = stripped
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            if members.is_empty() {
                None
            } else {
                Some(OriginAttribute::RoaSet(members))
            }
        } else {
            Some(OriginAttribute::Single(stripped.to_string()))
        }
    }

    /// Member tokens of this attribute, in table order
    pub fn members(&self) -> &[String] {
        match self {
            OriginAttribute::Single(asn) => std::slice::from_ref(asn),
            OriginAttribute::RoaSet(members) => members,
        }
    }
}

/// A reconstructed BGP table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Address prefix, never empty
    pub network: String,
    /// Origin attribute, absent when the row was cut short
    pub origin: Option<OriginAttribute>,
}

/// One (network, origin ASN) pair after AS-set expansion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OriginRecord {
    /// Address prefix
    pub network: String,
    /// Normalized ASN label (`AS64500`)
    pub asn: String,
}

/// Normalize an ASN token to the `AS<number>` convention
///
/// Tokens that are not numeric after an optional `AS` prefix are returned
/// trimmed but otherwise untouched; they resolve as "not found" later on.
pub fn normalize_asn(token: &str) -> String {
    let token = token.trim();
    let digits = strip_as_prefix(token);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        format!("AS{digits}")
    } else {
        token.to_string()
    }
}

/// Numeric value of an ASN label, if it has one
pub fn asn_number(label: &str) -> Option<u32> {
    strip_as_prefix(label.trim()).parse().ok()
}

fn strip_as_prefix(token: &str) -> &str {
    match token.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("as") => &token[2..],
        _ => token,
    }
}
