//! Aggregation and reporting of a pipeline run

pub mod aggregate;
pub mod output;

pub use aggregate::{AggregateRow, SortOrder, Summary};
pub use output::{attribution_line, ReportWriter};

use crate::asn::AttributionResult;
use crate::bgp::ParseStats;
use crate::error::{Error, Result};
use crate::region::RegionResult;
use serde::Serialize;
use std::collections::HashMap;

/// What one exchange capture contributed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeReport {
    /// Exchange label (`name-location`)
    pub label: String,
    /// Distinct networks seen
    pub networks: usize,
    /// Distinct ASNs seen
    pub asns: Vec<String>,
    /// Parse counters
    pub stats: ParseStats,
}

/// An exchange that could not be ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedExchange {
    /// Exchange label
    pub label: String,
    /// Why it failed
    pub error: String,
}

/// Merged result of a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Ingested exchanges, in configuration order
    pub exchanges: Vec<ExchangeReport>,
    /// Exchanges skipped for missing or unreadable captures
    pub failed: Vec<FailedExchange>,
    /// One attribution per distinct ASN across all exchanges
    pub attributions: Vec<AttributionResult>,
    /// Regions of the designated country's ASNs
    pub regions: Vec<RegionResult>,
    /// Whether the region step ran
    pub regions_available: bool,
    /// Frequency tables
    pub summary: Summary,
}

impl Report {
    /// Attributions of the ASNs one exchange saw, in that exchange's order
    pub fn results_for(&self, exchange: &ExchangeReport) -> Vec<&AttributionResult> {
        let by_asn: HashMap<&str, &AttributionResult> = self
            .attributions
            .iter()
            .map(|r| (r.asn.as_str(), r))
            .collect();
        exchange
            .asns
            .iter()
            .filter_map(|asn| by_asn.get(asn.as_str()).copied())
            .collect()
    }

    /// Pretty-printed JSON rendition
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            source,
            context: "serializing report".to_string(),
        })
    }
}
