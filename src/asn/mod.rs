//! ASN to country attribution
//!
//! Local data sets (RIR delegated stats, CC2ASN) are consulted before the
//! live services (Team Cymru DNS, ipinfo.io), in that fixed order.

pub mod cache;
pub mod cc2asn;
pub mod config;
pub mod cymru;
pub mod ipinfo;
pub mod provider;
pub mod resolver;
pub mod whois;

pub use cache::AttributionCache;
pub use cc2asn::{Cc2AsnIndex, Cc2AsnProvider};
pub use config::{ResolverSettings, ResolverSettingsBuilder};
pub use cymru::CymruProvider;
pub use ipinfo::IpinfoProvider;
pub use provider::{CountryProvider, CountrySet, LookupError, Registry, Source};
pub use resolver::{join_codes, AttributionResolver, AttributionResult};
pub use whois::{DelegatedIndex, WhoisProvider};
