//! Country lookup using Team Cymru's DNS service

use super::provider::{CountryProvider, CountrySet, LookupError, Source};
use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::sync::Arc;

/// Country values Cymru returns when it has nothing for an ASN
const NO_DATA: [&str; 2] = ["NA", "ZZ"];

/// Build the TXT query name for an ASN
pub fn form_asn_query(asn: u32) -> String {
    format!("AS{asn}.asn.cymru.com")
}

/// Extract the country from a Cymru AS TXT record
///
/// Records look like `64500 | BR | lacnic | 2005-01-01 | EXAMPLE-AS, BR`.
pub fn parse_country(txt: &str) -> Result<String, LookupError> {
    let parts: Vec<&str> = txt.split('|').map(str::trim).collect();
    if parts.len() < 3 || parts[0].is_empty() {
        return Err(LookupError::InvalidFormat);
    }

    let country = parts[1];
    if country.is_empty() || NO_DATA.contains(&country) {
        return Err(LookupError::NotFound);
    }
    Ok(country.to_ascii_lowercase())
}

/// Create a default DNS resolver for Cymru lookups
pub fn create_default_resolver() -> Arc<TokioResolver> {
    Arc::new(
        TokioResolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .build(),
    )
}

/// Provider querying `AS<n>.asn.cymru.com` TXT records
#[derive(Clone)]
pub struct CymruProvider {
    resolver: Arc<TokioResolver>,
}

impl CymruProvider {
    /// Create a provider with the default resolver
    pub fn new() -> Self {
        Self::with_resolver(create_default_resolver())
    }

    /// Create a provider with a specific DNS resolver
    pub fn with_resolver(resolver: Arc<TokioResolver>) -> Self {
        Self { resolver }
    }

    /// Query the country of an ASN
    pub async fn lookup(&self, asn: u32) -> Result<String, LookupError> {
        let lookup = self
            .resolver
            .txt_lookup(form_asn_query(asn))
            .await
            .map_err(|e| LookupError::DnsError(e.to_string()))?;

        let record = lookup.iter().next().ok_or(LookupError::NotFound)?;
        let txt_data = record
            .iter()
            .map(|data| String::from_utf8_lossy(data))
            .collect::<Vec<_>>()
            .join("");

        parse_country(&txt_data)
    }
}

impl Default for CymruProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CymruProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CymruProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl CountryProvider for CymruProvider {
    fn source(&self) -> Source {
        Source::Cymru
    }

    fn is_live(&self) -> bool {
        true
    }

    async fn resolve(&self, asn: u32) -> Option<CountrySet> {
        match self.lookup(asn).await {
            Ok(country) => Some(CountrySet::from_codes([country])),
            Err(e) => {
                tracing::debug!("cymru: AS{asn}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_asn_query() {
        assert_eq!(form_asn_query(64500), "AS64500.asn.cymru.com");
    }

    #[test]
    fn test_parse_country_valid() {
        let txt = "64500 | BR | lacnic | 2005-01-01 | EXAMPLE-AS, BR";
        assert_eq!(parse_country(txt).unwrap(), "br");
    }

    #[test]
    fn test_parse_country_whitespace() {
        let txt = "  15169  |  US  |  arin  |  2000-03-30  |  GOOGLE, US  ";
        assert_eq!(parse_country(txt).unwrap(), "us");
    }

    #[test]
    fn test_parse_country_sentinel() {
        assert!(matches!(
            parse_country("64512 | ZZ | other | | -Private Use AS-, ZZ"),
            Err(LookupError::NotFound)
        ));
        assert!(matches!(
            parse_country("64512 | NA | other | |"),
            Err(LookupError::NotFound)
        ));
        assert!(matches!(
            parse_country("64512 |  | other | |"),
            Err(LookupError::NotFound)
        ));
    }

    #[test]
    fn test_parse_country_invalid() {
        assert!(matches!(parse_country(""), Err(LookupError::InvalidFormat)));
        assert!(matches!(parse_country("garbage"), Err(LookupError::InvalidFormat)));
        assert!(matches!(parse_country("| | |"), Err(LookupError::InvalidFormat)));
    }

    #[tokio::test]
    async fn test_provider_is_live() {
        let provider = CymruProvider::new();
        assert!(provider.is_live());
        assert_eq!(provider.source(), Source::Cymru);
    }
}
