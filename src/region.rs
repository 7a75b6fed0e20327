//! Sub-national region enrichment
//!
//! ASNs attributed solely to the designated country are looked up in a
//! pipe-delimited national registry (ASN in the first field, region at a
//! configurable field). Every other ASN is left alone.

use crate::asn::AttributionResult;
use crate::bgp::asn_number;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Region reported when the registry has no entry
pub const NOT_AVAILABLE: &str = "na";

/// Default field index of the region in a registry line
pub const DEFAULT_REGION_FIELD: usize = 3;

/// Region of one ASN of the designated country
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionResult {
    /// Normalized ASN label
    pub asn: String,
    /// Region name, or [`NOT_AVAILABLE`]
    pub region: String,
}

/// ASN to region table
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: HashMap<u32, String>,
    malformed: usize,
}

impl RegionRegistry {
    /// Load a registry file, reading the region at `field`
    pub fn from_path(path: &Path, field: usize) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let registry = Self::from_reader(BufReader::new(file), field, path)?;
        tracing::info!(
            entries = registry.len(),
            malformed = registry.malformed,
            "Loaded region registry {}",
            path.display()
        );
        Ok(registry)
    }

    /// Parse registry lines from a reader
    pub fn from_reader<R: BufRead>(reader: R, field: usize, origin: &Path) -> Result<Self> {
        let mut registry = Self::default();
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(e, origin))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('|').map(str::trim).collect();
            let asn = fields.first().and_then(|f| asn_number(f));
            let region = fields.get(field).filter(|r| !r.is_empty());
            match (asn, region) {
                (Some(asn), Some(region)) => {
                    registry.regions.entry(asn).or_insert_with(|| region.to_string());
                }
                _ => registry.malformed += 1,
            }
        }
        Ok(registry)
    }

    /// Region of a numeric ASN
    pub fn lookup(&self, asn: u32) -> Option<&str> {
        self.regions.get(&asn).map(String::as_str)
    }

    /// Number of ASNs in the registry
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Lines skipped for lacking an ASN or a region
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

/// Looks up regions for the ASNs of one designated country
#[derive(Debug, Clone)]
pub struct RegionalEnricher {
    registry: RegionRegistry,
    country: String,
}

impl RegionalEnricher {
    /// Create an enricher for `country` (case-insensitive)
    pub fn new(registry: RegionRegistry, country: &str) -> Self {
        Self {
            registry,
            country: country.to_ascii_lowercase(),
        }
    }

    /// Whether an attribution names the designated country and nothing else
    pub fn applies_to(&self, result: &AttributionResult) -> bool {
        result.country_codes.len() == 1 && result.country_codes.contains(&self.country)
    }

    /// One region per applicable attribution, in input order
    pub fn enrich(&self, results: &[AttributionResult]) -> Vec<RegionResult> {
        let regions: Vec<RegionResult> = results
            .iter()
            .filter(|r| self.applies_to(r))
            .map(|r| RegionResult {
                asn: r.asn.clone(),
                region: asn_number(&r.asn)
                    .and_then(|n| self.registry.lookup(n))
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string(),
            })
            .collect();
        tracing::debug!(
            country = %self.country,
            enriched = regions.len(),
            "Regional enrichment done"
        );
        regions
    }
}
