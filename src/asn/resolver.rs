//! Attribution resolver
//!
//! Runs the ordered provider chain for each ASN. Within one ASN the chain
//! is strictly sequential; across ASNs a batch runs with bounded
//! concurrency so the live providers are not flooded.

use super::cache::AttributionCache;
use super::config::ResolverSettings;
use super::provider::{CountryProvider, CountrySet, Registry, Source};
use crate::bgp::records::{asn_number, normalize_asn};
use crate::bgp::reduce::{asn_sort_key, sort_asns};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Attribution of one ASN
///
/// `source` is [`Source::None`] exactly when `country_codes` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionResult {
    /// Normalized ASN label (`AS64500`)
    pub asn: String,
    /// Lowercase country codes
    pub country_codes: BTreeSet<String>,
    /// Registries whose records matched (whois provider only)
    pub registries: BTreeSet<Registry>,
    /// Provider that produced the attribution
    pub source: Source,
}

impl AttributionResult {
    /// An attribution no provider could make
    pub fn unresolved(asn: impl Into<String>) -> Self {
        Self {
            asn: asn.into(),
            country_codes: BTreeSet::new(),
            registries: BTreeSet::new(),
            source: Source::None,
        }
    }

    /// An attribution made by `source`; an empty set is unresolved
    pub fn resolved(asn: impl Into<String>, source: Source, set: CountrySet) -> Self {
        if set.is_empty() {
            return Self::unresolved(asn);
        }
        Self {
            asn: asn.into(),
            country_codes: set.codes,
            registries: set.registries,
            source,
        }
    }

    /// Whether no provider knew this ASN
    pub fn is_missing(&self) -> bool {
        self.source == Source::None
    }
}

/// Resolver running an ordered chain of country providers
pub struct AttributionResolver {
    providers: Vec<Arc<dyn CountryProvider>>,
    settings: ResolverSettings,
    cache: AttributionCache,
    cancel: CancellationToken,
}

impl AttributionResolver {
    /// Create a resolver; providers are tried in the given order
    ///
    /// Live providers are left out when `settings.live` is false.
    pub fn new(providers: Vec<Arc<dyn CountryProvider>>, settings: ResolverSettings) -> Self {
        Self::with_cache(providers, settings, AttributionCache::new())
    }

    /// Create a resolver sharing an existing cache
    pub fn with_cache(
        providers: Vec<Arc<dyn CountryProvider>>,
        settings: ResolverSettings,
        cache: AttributionCache,
    ) -> Self {
        let providers: Vec<_> = providers
            .into_iter()
            .filter(|p| settings.live || !p.is_live())
            .collect();
        tracing::debug!(
            "Provider chain: {}",
            providers
                .iter()
                .map(|p| p.source().as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Self {
            providers,
            settings,
            cache,
            cancel: CancellationToken::new(),
        }
    }

    /// Provenance tags of the chain, in order
    pub fn chain(&self) -> Vec<Source> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// The attribution cache
    pub fn cache(&self) -> &AttributionCache {
        &self.cache
    }

    /// Abandon pending live queries; they resolve as empty
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolve one ASN
    pub async fn resolve(&self, asn: &str) -> AttributionResult {
        self.resolve_with(asn, &self.cancel).await
    }

    /// Resolve a batch of ASNs with bounded concurrency
    ///
    /// Duplicates are collapsed; exactly one result is returned per
    /// distinct ASN, in ASN order.
    pub async fn resolve_batch<I, S>(&self, asns: I) -> Vec<AttributionResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let asns = sort_asns(asns.into_iter().map(|a| normalize_asn(a.as_ref())));
        let total = asns.len();
        let batch = self.cancel.child_token();

        let timer = self.settings.deadline.map(|deadline| {
            let token = batch.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!("Attribution deadline of {deadline:?} reached, abandoning live lookups");
                token.cancel();
            })
        });

        let batch_ref = &batch;
        let mut results: Vec<AttributionResult> = stream::iter(asns)
            .map(|asn| async move { self.resolve_with(&asn, batch_ref).await })
            .buffer_unordered(self.settings.workers.max(1))
            .collect()
            .await;

        if let Some(timer) = timer {
            timer.abort();
        }

        results.sort_by_cached_key(|r| asn_sort_key(&r.asn));
        let missing = results.iter().filter(|r| r.is_missing()).count();
        tracing::info!(total, missing, "Resolved attribution batch");
        results
    }

    async fn resolve_with(&self, asn: &str, cancel: &CancellationToken) -> AttributionResult {
        let label = normalize_asn(asn);
        if let Some(hit) = self.cache.get(&label) {
            return hit;
        }

        let result = match asn_number(&label) {
            Some(number) => self.run_chain(&label, number, cancel).await,
            None => {
                tracing::debug!("{label}: not an ASN, skipping providers");
                AttributionResult::unresolved(label)
            }
        };

        if !cancel.is_cancelled() {
            self.cache.insert(result.clone());
        }
        result
    }

    async fn run_chain(&self, label: &str, asn: u32, cancel: &CancellationToken) -> AttributionResult {
        for provider in &self.providers {
            if let Some(set) = self.query(provider.as_ref(), asn, cancel).await {
                if !set.is_empty() {
                    tracing::debug!("{label}: {} via {}", join_codes(&set.codes), provider.source());
                    return AttributionResult::resolved(label, provider.source(), set);
                }
            }
        }
        tracing::debug!("{label}: unresolved");
        AttributionResult::unresolved(label)
    }

    async fn query(
        &self,
        provider: &dyn CountryProvider,
        asn: u32,
        cancel: &CancellationToken,
    ) -> Option<CountrySet> {
        if !provider.is_live() {
            return provider.resolve(asn).await;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("AS{asn}: {} lookup cancelled", provider.source());
                None
            }
            outcome = tokio::time::timeout(self.settings.provider_timeout, provider.resolve(asn)) => {
                match outcome {
                    Ok(set) => set,
                    Err(_) => {
                        tracing::debug!("AS{asn}: {} lookup timed out", provider.source());
                        None
                    }
                }
            }
        }
    }
}

/// Space-separated country codes, as written in attribution files
pub fn join_codes(codes: &BTreeSet<String>) -> String {
    codes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}
