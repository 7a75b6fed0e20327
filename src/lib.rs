//! ixgeo - Internet Exchange participant geolocation
//!
//! This library reconstructs origin ASNs from raw router BGP table
//! captures taken at Internet Exchange Points, attributes each ASN to
//! countries through an ordered chain of data sources, and aggregates the
//! result into per-country, per-registry and per-region summaries.

pub mod alice;
pub mod asn;
pub mod bgp;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod region;
pub mod report;

// Re-export core types for library users
pub use asn::{AttributionResolver, AttributionResult, ResolverSettings, Source};
pub use bgp::{ReferencePrefixSet, ReportVariant, TableParser};
pub use config::{Config, ExchangeConfig};
pub use error::{Error, Result};
pub use report::{Report, SortOrder};
