//! End-to-end run: ingest every exchange, resolve, enrich, aggregate
//!
//! Exchange captures are parsed on blocking tasks, one per exchange, and
//! joined before attribution so every ASN is resolved once however many
//! exchanges it appears at. Local data sets are loaded on blocking tasks
//! too, so the runtime threads only drive lookups.

use crate::alice;
use crate::asn::{
    AttributionResolver, Cc2AsnProvider, CountryProvider, CymruProvider, IpinfoProvider,
    WhoisProvider,
};
use crate::bgp::{expand_all, reduce, ParseStats, Reduced};
use crate::config::{CaptureFormat, Config, DataConfig, ExchangeConfig};
use crate::error::{Error, Result};
use crate::region::{RegionRegistry, RegionalEnricher};
use crate::report::{ExchangeReport, FailedExchange, Report, SortOrder, Summary};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Distinct ASNs and networks of one exchange capture
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Exchange label
    pub label: String,
    /// Distinct ASNs and networks
    pub reduced: Reduced,
    /// Parse counters
    pub stats: ParseStats,
}

impl From<Ingested> for ExchangeReport {
    fn from(ingested: Ingested) -> Self {
        ExchangeReport {
            label: ingested.label,
            networks: ingested.reduced.networks.len(),
            asns: ingested.reduced.asns,
            stats: ingested.stats,
        }
    }
}

/// Parse, expand and reduce one exchange capture
pub fn ingest(exchange: &ExchangeConfig) -> Result<Ingested> {
    let label = exchange.label();
    let (records, stats) = match exchange.format {
        CaptureFormat::Table => {
            let capture = std::fs::read_to_string(&exchange.capture)
                .map_err(|e| Error::io(e, &exchange.capture))?;
            let output = exchange.parser().parse_str(&capture);
            (expand_all(output.records), output.stats)
        }
        CaptureFormat::Alice => {
            let import = alice::import_path(&exchange.capture)?;
            (import.records, import.stats)
        }
    };

    let reduced = reduce(records);
    tracing::info!(
        asns = reduced.asns.len(),
        networks = reduced.networks.len(),
        continuations = stats.continuations,
        malformed = stats.malformed,
        "Ingested {label}"
    );
    Ok(Ingested {
        label,
        reduced,
        stats,
    })
}

/// Ingest every exchange concurrently
///
/// A failing exchange is reported and skipped; the others still count.
pub async fn ingest_all(exchanges: &[ExchangeConfig]) -> (Vec<Ingested>, Vec<FailedExchange>) {
    let handles: Vec<_> = exchanges
        .iter()
        .cloned()
        .map(|exchange| {
            let label = exchange.label();
            (label, tokio::task::spawn_blocking(move || ingest(&exchange)))
        })
        .collect();

    let mut ingested = Vec::with_capacity(handles.len());
    let mut failed = Vec::new();
    for (label, handle) in handles {
        let error = match handle.await {
            Ok(Ok(exchange)) => {
                ingested.push(exchange);
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("ingest task failed: {e}"),
        };
        tracing::warn!("Skipping {label}: {error}");
        failed.push(FailedExchange { label, error });
    }
    (ingested, failed)
}

/// Load a local provider, disabling it when its data is absent
fn load_local<P, F>(name: &str, path: Option<&Path>, load: F) -> Result<Option<P>>
where
    F: FnOnce(&Path) -> Result<P>,
{
    let Some(path) = path else {
        tracing::debug!("No {name} data configured");
        return Ok(None);
    };
    match load(path) {
        Ok(provider) => Ok(Some(provider)),
        Err(Error::MissingInput { path }) => {
            tracing::warn!("{name} data {} not found, provider disabled", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Load the whois and cc2asn providers, in chain order
fn load_local_chain(data: &DataConfig) -> Result<Vec<Arc<dyn CountryProvider>>> {
    let mut chain: Vec<Arc<dyn CountryProvider>> = Vec::new();
    if let Some(whois) = load_local("whois", data.whois_dir.as_deref(), WhoisProvider::from_path)? {
        chain.push(Arc::new(whois));
    }
    if let Some(cc2asn) = load_local("cc2asn", data.cc2asn_dir.as_deref(), Cc2AsnProvider::from_path)? {
        chain.push(Arc::new(cc2asn));
    }
    Ok(chain)
}

/// Build the provider chain: whois, cc2asn, cymru, ipinfo
pub async fn build_chain(config: &Config) -> Result<Vec<Arc<dyn CountryProvider>>> {
    let data = config.data.clone();
    let mut chain = tokio::task::spawn_blocking(move || load_local_chain(&data))
        .await
        .map_err(|e| Error::Config(format!("provider load task failed: {e}")))??;

    if config.resolver.live {
        chain.push(Arc::new(CymruProvider::new()));
        let timeout = Duration::from_millis(config.resolver.provider_timeout_ms);
        match IpinfoProvider::with_base_url(&config.resolver.ipinfo_base_url, timeout) {
            Ok(ipinfo) => chain.push(Arc::new(ipinfo)),
            Err(e) => tracing::warn!("ipinfo provider disabled: {e}"),
        }
    }

    if chain.is_empty() {
        tracing::warn!("No attribution provider available, every ASN will be unresolved");
    }
    Ok(chain)
}

/// Build a resolver from the configuration
pub async fn build_resolver(config: &Config) -> Result<AttributionResolver> {
    let settings = config.resolver.settings()?;
    Ok(AttributionResolver::new(build_chain(config).await?, settings))
}

/// Load the regional enricher, if a registry is configured and present
async fn load_enricher(config: &Config) -> Option<RegionalEnricher> {
    let path = config.data.region_registry.clone()?;
    let field = config.region.field;
    let loaded = tokio::task::spawn_blocking(move || RegionRegistry::from_path(&path, field)).await;
    match loaded {
        Ok(Ok(registry)) => Some(RegionalEnricher::new(registry, &config.region.country)),
        Ok(Err(e)) => {
            tracing::warn!("Region step skipped: {e}");
            None
        }
        Err(e) => {
            tracing::warn!("Region step skipped: registry load task failed: {e}");
            None
        }
    }
}

/// Run the whole pipeline for a configuration
pub async fn run(config: &Config, order: SortOrder) -> Result<Report> {
    let resolver = build_resolver(config).await?;
    run_with(config, &resolver, order).await
}

/// Run the pipeline with an existing resolver
pub async fn run_with(
    config: &Config,
    resolver: &AttributionResolver,
    order: SortOrder,
) -> Result<Report> {
    let (ingested, failed) = ingest_all(&config.exchanges).await;
    tracing::info!(
        exchanges = ingested.len(),
        failed = failed.len(),
        "Ingestion finished"
    );

    let asns: Vec<&str> = ingested
        .iter()
        .flat_map(|i| i.reduced.asns.iter().map(String::as_str))
        .collect();
    let attributions = resolver.resolve_batch(asns).await;

    let enricher = load_enricher(config).await;
    let regions = enricher
        .as_ref()
        .map(|e| e.enrich(&attributions))
        .unwrap_or_default();

    let summary = Summary::build(&attributions, &regions, order);
    Ok(Report {
        exchanges: ingested.into_iter().map(ExchangeReport::from).collect(),
        failed,
        attributions,
        regions,
        regions_available: enricher.is_some(),
        summary,
    })
}
