//! Country lookup from ipinfo.io AS pages
//!
//! The public AS page links the holder's country as `/countries/<cc>`;
//! the first such link on the page is taken.

use super::provider::{CountryProvider, CountrySet, LookupError, Source};
use async_trait::async_trait;
use std::time::Duration;

/// Default base URL of the AS pages
pub const DEFAULT_BASE_URL: &str = "https://ipinfo.io";

const COUNTRY_LINK: &str = "/countries/";

/// Extract the country code from an AS page body
pub fn extract_country(body: &str) -> Option<String> {
    body.match_indices(COUNTRY_LINK).find_map(|(at, _)| {
        let rest = &body[at + COUNTRY_LINK.len()..];
        let code: String = rest
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect();
        (code.len() == 2).then(|| code.to_ascii_lowercase())
    })
}

/// Provider scraping `https://ipinfo.io/AS<n>`
#[derive(Debug, Clone)]
pub struct IpinfoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl IpinfoProvider {
    /// Create a provider against the public site
    pub fn new(timeout: Duration) -> Result<Self, LookupError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Create a provider against another base URL
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::HttpError(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of an ASN's page
    pub fn url_for(&self, asn: u32) -> String {
        format!("{}/AS{asn}", self.base_url)
    }

    /// Fetch the page and extract its country
    pub async fn lookup(&self, asn: u32) -> Result<String, LookupError> {
        let response = self
            .client
            .get(self.url_for(asn))
            .send()
            .await
            .map_err(|e| LookupError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::HttpError(format!("status {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::HttpError(e.to_string()))?;

        extract_country(&body).ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl CountryProvider for IpinfoProvider {
    fn source(&self) -> Source {
        Source::Ipinfo
    }

    fn is_live(&self) -> bool {
        true
    }

    async fn resolve(&self, asn: u32) -> Option<CountrySet> {
        match self.lookup(asn).await {
            Ok(country) => Some(CountrySet::from_codes([country])),
            Err(e) => {
                tracing::debug!("ipinfo: AS{asn}: {e}");
                None
            }
        }
    }
}
