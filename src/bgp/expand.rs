//! AS-set expansion
//!
//! Turns each [`NetworkRecord`] into one [`OriginRecord`] per member of its
//! origin attribute. Member tokens are not validated here; anything that is
//! not an ASN falls out later as an unresolved attribution.

use super::records::{normalize_asn, NetworkRecord, OriginRecord};

/// Expand a single record into its origin records
///
/// Records without an origin attribute expand to nothing.
pub fn expand(record: NetworkRecord) -> Vec<OriginRecord> {
    let NetworkRecord { network, origin } = record;
    let Some(origin) = origin else {
        return Vec::new();
    };

    origin
        .members()
        .iter()
        .map(|member| OriginRecord {
            network: network.clone(),
            asn: normalize_asn(member),
        })
        .collect()
}

/// Expand every record, preserving capture order
pub fn expand_all(records: Vec<NetworkRecord>) -> Vec<OriginRecord> {
    records.into_iter().flat_map(expand).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::records::OriginAttribute;

    fn record(network: &str, token: &str) -> NetworkRecord {
        NetworkRecord {
            network: network.to_string(),
            origin: OriginAttribute::from_token(token),
        }
    }

    #[test]
    fn test_expand_single() {
        let out = expand(record("203.0.113.0/24", "64502"));
        assert_eq!(
            out,
            vec![OriginRecord {
                network: "203.0.113.0/24".to_string(),
                asn: "AS64502".to_string(),
            }]
        );
    }

    #[test]
    fn test_expand_roa_set() {
        let out = expand(record("203.0.113.0/24", "{64500,64501,64503}"));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.network == "203.0.113.0/24"));
        let asns: Vec<&str> = out.iter().map(|r| r.asn.as_str()).collect();
        assert_eq!(asns, vec!["AS64500", "AS64501", "AS64503"]);
    }

    #[test]
    fn test_expand_without_origin() {
        let out = expand(NetworkRecord {
            network: "203.0.113.0/24".to_string(),
            origin: None,
        });
        assert!(out.is_empty());
    }

    #[test]
    fn test_malformed_members_pass_through() {
        let out = expand(record("203.0.113.0/24", "{64500,bogus}"));
        assert_eq!(out[1].asn, "bogus");
    }

    #[test]
    fn test_expand_all_keeps_order() {
        let out = expand_all(vec![
            record("203.0.113.0/24", "{64500,64501}"),
            record("203.0.113.0/24", "64502"),
        ]);
        let asns: Vec<&str> = out.iter().map(|r| r.asn.as_str()).collect();
        assert_eq!(asns, vec!["AS64500", "AS64501", "AS64502"]);
    }
}
