//! Reduction of origin records to distinct networks and ASNs

use super::records::{asn_number, normalize_asn, OriginRecord};
use serde::Serialize;
use std::collections::BTreeSet;

/// Distinct ASNs and networks of one capture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reduced {
    /// Distinct ASN labels, numeric order first, then malformed labels
    pub asns: Vec<String>,
    /// Distinct networks, lexically ordered
    pub networks: Vec<String>,
}

/// Deduplicate origin records into sorted ASN and network sets
pub fn reduce(records: Vec<OriginRecord>) -> Reduced {
    let mut asns = BTreeSet::new();
    let mut networks = BTreeSet::new();

    for OriginRecord { network, asn } in records {
        asns.insert(normalize_asn(&asn));
        networks.insert(network);
    }

    Reduced {
        asns: sort_asns(asns),
        networks: networks.into_iter().collect(),
    }
}

/// Order ASN labels numerically; labels without a number sort last
pub fn sort_asns(asns: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut sorted: Vec<String> = asns.into_iter().collect();
    sorted.sort_by_cached_key(|s| asn_sort_key(s));
    sorted.dedup();
    sorted
}

/// Sort key putting numeric ASNs first, in numeric order
pub fn asn_sort_key(label: &str) -> (u8, u32, String) {
    match asn_number(label) {
        Some(n) => (0, n, label.to_string()),
        None => (1, 0, label.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(network: &str, asn: &str) -> OriginRecord {
        OriginRecord {
            network: network.to_string(),
            asn: asn.to_string(),
        }
    }

    #[test]
    fn test_reduce_deduplicates() {
        let input = vec![
            origin("203.0.113.0/24", "AS64500"),
            origin("203.0.113.0/24", "AS64501"),
            origin("203.0.113.0/24", "AS64500"),
            origin("198.51.100.0/24", "64500"),
        ];
        let input_len = input.len();
        let reduced = reduce(input);
        assert_eq!(reduced.asns, vec!["AS64500", "AS64501"]);
        assert_eq!(reduced.networks, vec!["198.51.100.0/24", "203.0.113.0/24"]);
        assert!(reduced.asns.len() <= input_len);
        assert!(reduced.networks.len() <= input_len);
    }

    #[test]
    fn test_reduce_empty() {
        assert_eq!(reduce(Vec::new()), Reduced::default());
    }

    #[test]
    fn test_asns_sort_numerically() {
        let sorted = sort_asns(vec![
            "AS64500".to_string(),
            "AS9".to_string(),
            "bogus".to_string(),
            "AS100".to_string(),
        ]);
        assert_eq!(sorted, vec!["AS9", "AS100", "AS64500", "bogus"]);
    }
}
