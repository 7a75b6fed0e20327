//! Configuration file handling
//!
//! The configuration is a TOML file naming the local data sets, the
//! resolver settings, the regional registry and one `[[exchange]]` table
//! per captured exchange/location. Relative paths are taken relative to
//! the directory holding the configuration file.

use crate::asn::config::{ResolverSettings, DEFAULT_PROVIDER_TIMEOUT_MS, DEFAULT_WORKERS};
use crate::asn::ipinfo::DEFAULT_BASE_URL;
use crate::bgp::parser::{DEFAULT_MARKER, DEFAULT_PATH_COLUMN};
use crate::bgp::{ReferencePrefixSet, ReportVariant, TableParser};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locally held data sets
    pub data: DataConfig,
    /// Attribution resolver settings
    pub resolver: ResolverConfig,
    /// Regional enrichment settings
    pub region: RegionConfig,
    /// Output settings
    pub output: OutputConfig,
    /// Exchange captures to ingest
    #[serde(rename = "exchange")]
    pub exchanges: Vec<ExchangeConfig>,
}

/// Paths of the local data sets; absent paths disable what needs them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory (or file) of RIR delegated-stats extracts
    pub whois_dir: Option<PathBuf>,
    /// Root of the CC2ASN dataset
    pub cc2asn_dir: Option<PathBuf>,
    /// Pipe-delimited regional registry
    pub region_registry: Option<PathBuf>,
}

/// Resolver section of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Concurrent ASN resolutions
    pub workers: usize,
    /// Timeout of one live provider call in milliseconds
    pub provider_timeout_ms: u64,
    /// Deadline of a whole batch in seconds
    pub deadline_secs: Option<u64>,
    /// Query the live providers
    pub live: bool,
    /// Base URL of the ipinfo AS pages
    pub ipinfo_base_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            deadline_secs: None,
            live: true,
            ipinfo_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Validated resolver settings
    pub fn settings(&self) -> Result<ResolverSettings> {
        let mut builder = ResolverSettings::builder()
            .workers(self.workers)
            .provider_timeout(Duration::from_millis(self.provider_timeout_ms))
            .live(self.live);
        if let Some(secs) = self.deadline_secs {
            builder = builder.deadline(Duration::from_secs(secs));
        }
        builder.build().map_err(Error::Config)
    }
}

/// Regional enrichment section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// The one country whose ASNs are enriched
    pub country: String,
    /// Zero-based field index of the region in the registry
    pub field: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            country: "br".to_string(),
            field: 3,
        }
    }
}

/// Output section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the report files are written to
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
        }
    }
}

/// Layout of a capture file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    /// Router "show ip bgp" terminal capture
    #[default]
    Table,
    /// Alice-LG looking glass routes JSON
    Alice,
}

/// Which origin attribute a table capture is reduced to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Origin AS
    #[default]
    Origin,
    /// Neighbour AS at a fixed column
    Connected,
}

/// One exchange/location capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Exchange name (e.g. "ix.br")
    pub name: String,
    /// Location within the exchange (e.g. "sp")
    #[serde(default)]
    pub location: Option<String>,
    /// Capture file
    pub capture: PathBuf,
    /// Capture layout
    #[serde(default)]
    pub format: CaptureFormat,
    /// Origin attribute to extract
    #[serde(default)]
    pub variant: VariantKind,
    /// Column where the Path field starts
    #[serde(default = "default_path_column")]
    pub path_column: usize,
    /// Status marker of table rows
    #[serde(default = "default_marker")]
    pub marker: char,
    /// Peering LAN prefixes used to spot continuation rows
    #[serde(default)]
    pub reference_prefixes: Vec<String>,
}

fn default_path_column() -> usize {
    DEFAULT_PATH_COLUMN
}

fn default_marker() -> char {
    DEFAULT_MARKER
}

impl ExchangeConfig {
    /// Create a table-capture exchange with defaults
    pub fn new(name: impl Into<String>, capture: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: None,
            capture: capture.into(),
            format: CaptureFormat::Table,
            variant: VariantKind::Origin,
            path_column: DEFAULT_PATH_COLUMN,
            marker: DEFAULT_MARKER,
            reference_prefixes: Vec::new(),
        }
    }

    /// Label used in logs and output file names
    pub fn label(&self) -> String {
        match &self.location {
            Some(location) if !location.is_empty() => format!("{}-{}", self.name, location),
            _ => self.name.clone(),
        }
    }

    /// Parser for this exchange's table layout
    pub fn parser(&self) -> TableParser {
        let variant = match self.variant {
            VariantKind::Origin => ReportVariant::Origin,
            VariantKind::Connected => ReportVariant::Connected,
        };
        let prefixes = ReferencePrefixSet::from_strings(&self.reference_prefixes);
        if prefixes.is_empty() && self.format == CaptureFormat::Table {
            tracing::warn!(
                "{}: continuation heuristic unavailable, parsing literally",
                self.label()
            );
        }
        TableParser::new(prefixes, variant)
            .with_marker(self.marker)
            .with_path_column(self.path_column)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(
            exchanges = config.exchanges.len(),
            "Loaded configuration from {}",
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        self.resolver.settings()?;

        let country = &self.region.country;
        if country.len() < 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Config(format!(
                "region.country must be a country code, got {country:?}"
            )));
        }

        let mut labels = HashSet::new();
        for exchange in &self.exchanges {
            if exchange.name.trim().is_empty() {
                return Err(Error::Config("exchange name must not be empty".to_string()));
            }
            if exchange.marker.is_whitespace() {
                return Err(Error::Config(format!(
                    "{}: marker must not be whitespace",
                    exchange.label()
                )));
            }
            if !labels.insert(exchange.label()) {
                return Err(Error::Config(format!(
                    "duplicate exchange {}",
                    exchange.label()
                )));
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.data.whois_dir.iter_mut().for_each(rebase);
        self.data.cc2asn_dir.iter_mut().for_each(rebase);
        self.data.region_registry.iter_mut().for_each(rebase);
        rebase(&mut self.output.dir);
        for exchange in &mut self.exchanges {
            rebase(&mut exchange.capture);
        }
    }
}
