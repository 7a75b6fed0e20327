//! Frequency tables over merged attributions

use crate::asn::{AttributionResult, Registry};
use crate::bgp::reduce::sort_asns;
use crate::region::RegionResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Order of summary rows by count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Largest count first
    #[default]
    Descending,
    /// Smallest count first
    Ascending,
}

/// One row of a frequency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    /// Country code, registry or region
    pub key: String,
    /// Number of distinct ASNs with that key
    pub count: usize,
}

impl AggregateRow {
    /// Create a row
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Turn key counts into rows sorted by count, ties by ascending key
fn into_rows(counts: BTreeMap<String, usize>, order: SortOrder) -> Vec<AggregateRow> {
    let mut rows: Vec<AggregateRow> = counts
        .into_iter()
        .map(|(key, count)| AggregateRow { key, count })
        .collect();
    // BTreeMap already yields keys ascending; a stable sort keeps that for ties
    match order {
        SortOrder::Descending => rows.sort_by(|a, b| b.count.cmp(&a.count)),
        SortOrder::Ascending => rows.sort_by(|a, b| a.count.cmp(&b.count)),
    }
    rows
}

fn tally<'a>(keys: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Distinct `(asn, code)` pairs across all results
pub fn country_pairs(results: &[AttributionResult]) -> BTreeSet<(&str, &str)> {
    results
        .iter()
        .flat_map(|r| {
            r.country_codes
                .iter()
                .map(move |code| (r.asn.as_str(), code.as_str()))
        })
        .collect()
}

/// Number of distinct ASNs per country
pub fn count_countries(results: &[AttributionResult], order: SortOrder) -> Vec<AggregateRow> {
    let pairs = country_pairs(results);
    into_rows(tally(pairs.into_iter().map(|(_, code)| code)), order)
}

/// Number of distinct ASNs per registry
pub fn count_registries(results: &[AttributionResult], order: SortOrder) -> Vec<AggregateRow> {
    let pairs: BTreeSet<(&str, Registry)> = results
        .iter()
        .flat_map(|r| r.registries.iter().map(move |reg| (r.asn.as_str(), *reg)))
        .collect();
    into_rows(tally(pairs.into_iter().map(|(_, reg)| reg.as_str())), order)
}

/// Number of ASNs per region, one region per ASN
pub fn count_regions(regions: &[RegionResult], order: SortOrder) -> Vec<AggregateRow> {
    let mut by_asn: BTreeMap<&str, &str> = BTreeMap::new();
    for region in regions {
        by_asn.entry(region.asn.as_str()).or_insert(region.region.as_str());
    }
    into_rows(tally(by_asn.into_values()), order)
}

/// Distinct unresolved ASNs, in ASN order
pub fn missing(results: &[AttributionResult]) -> Vec<String> {
    sort_asns(
        results
            .iter()
            .filter(|r| r.is_missing())
            .map(|r| r.asn.clone()),
    )
}

/// All frequency tables of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Distinct ASNs per country
    pub countries: Vec<AggregateRow>,
    /// Distinct ASNs per registry
    pub registries: Vec<AggregateRow>,
    /// ASNs of the designated country per region
    pub regions: Vec<AggregateRow>,
    /// Unresolved ASNs
    pub missing: Vec<String>,
}

impl Summary {
    /// Build all tables from merged attributions and regions
    pub fn build(results: &[AttributionResult], regions: &[RegionResult], order: SortOrder) -> Self {
        Self {
            countries: count_countries(results, order),
            registries: count_registries(results, order),
            regions: count_regions(regions, order),
            missing: missing(results),
        }
    }

    /// Sum of all region counts
    pub fn region_total(&self) -> usize {
        self.regions.iter().map(|r| r.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::{CountrySet, Source};

    fn attributed(asn: &str, codes: &[&str]) -> AttributionResult {
        AttributionResult::resolved(asn, Source::Cymru, CountrySet::from_codes(codes))
    }

    fn from_whois(asn: &str, code: &str, registry: Registry) -> AttributionResult {
        let mut set = CountrySet::from_codes([code]);
        set.registries.insert(registry);
        AttributionResult::resolved(asn, Source::Whois, set)
    }

    #[test]
    fn test_country_counts_sum_to_distinct_pairs() {
        let results = vec![
            attributed("AS1", &["br"]),
            attributed("AS2", &["br", "us"]),
            attributed("AS3", &["us"]),
            // Same ASN seen at a second exchange
            attributed("AS2", &["br", "us"]),
            AttributionResult::unresolved("AS4"),
        ];

        let rows = count_countries(&results, SortOrder::Descending);
        assert_eq!(rows, vec![AggregateRow::new("br", 2), AggregateRow::new("us", 2)]);
        let total: usize = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, country_pairs(&results).len());
        assert_eq!(total, 4);
    }

    #[test]
    fn test_sort_order_and_tie_break() {
        let results = vec![
            attributed("AS1", &["nl"]),
            attributed("AS2", &["br"]),
            attributed("AS3", &["br"]),
            attributed("AS4", &["ar"]),
        ];

        let descending = count_countries(&results, SortOrder::Descending);
        let keys: Vec<&str> = descending.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["br", "ar", "nl"]);

        let ascending = count_countries(&results, SortOrder::Ascending);
        let keys: Vec<&str> = ascending.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["ar", "nl", "br"]);
    }

    #[test]
    fn test_registry_counts() {
        let results = vec![
            from_whois("AS1", "br", Registry::Lacnic),
            from_whois("AS2", "br", Registry::Lacnic),
            from_whois("AS1", "br", Registry::Lacnic),
            from_whois("AS3", "nl", Registry::RipeNcc),
            attributed("AS4", &["us"]),
        ];
        let rows = count_registries(&results, SortOrder::Descending);
        assert_eq!(
            rows,
            vec![AggregateRow::new("lacnic", 2), AggregateRow::new("ripencc", 1)]
        );
    }

    #[test]
    fn test_region_counts_one_per_asn() {
        let region = |asn: &str, region: &str| RegionResult {
            asn: asn.to_string(),
            region: region.to_string(),
        };
        let regions = vec![
            region("AS1", "SP"),
            region("AS2", "SP"),
            region("AS2", "SP"),
            region("AS3", "na"),
        ];
        let summary = Summary::build(&[], &regions, SortOrder::Descending);
        assert_eq!(
            summary.regions,
            vec![AggregateRow::new("SP", 2), AggregateRow::new("na", 1)]
        );
        assert_eq!(summary.region_total(), 3);
    }

    #[test]
    fn test_missing_is_sorted_and_distinct() {
        let results = vec![
            AttributionResult::unresolved("AS99999"),
            attributed("AS1", &["br"]),
            AttributionResult::unresolved("AS100"),
            AttributionResult::unresolved("AS99999"),
        ];
        assert_eq!(missing(&results), vec!["AS100", "AS99999"]);
    }

    #[test]
    fn test_empty_input() {
        let summary = Summary::build(&[], &[], SortOrder::Ascending);
        assert_eq!(summary, Summary::default());
    }
}
