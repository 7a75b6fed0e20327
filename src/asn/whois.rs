//! Country lookup from RIR delegated-stats extracts
//!
//! Each registry publishes `registry|cc|type|start|value|date|status`
//! lines; only `asn` records are indexed here. `value` is the number of
//! consecutive ASNs the record covers.

use super::provider::{CountryProvider, CountrySet, LookupError, Registry, Source};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// One `asn` record of a delegated-stats file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnDelegation {
    /// Registry that published the record
    pub registry: Registry,
    /// Country code as published (not yet lowercased)
    pub cc: String,
    /// First ASN covered
    pub start: u32,
    /// Number of ASNs covered
    pub count: u32,
}

impl AsnDelegation {
    /// Whether this record covers the ASN
    pub fn contains(&self, asn: u32) -> bool {
        asn >= self.start && u64::from(asn) < u64::from(self.start) + u64::from(self.count)
    }
}

/// Outcome of reading one delegated-stats line
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Asn(AsnDelegation),
    /// Header, summary, comment or non-asn resource
    Other,
}

impl FromStr for Line {
    type Err = LookupError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('#') {
            return Ok(Line::Other);
        }

        let mut values = s.split('|');
        let reg_str = values.next().ok_or(LookupError::InvalidFormat)?;
        let cc_str = values.next().ok_or(LookupError::InvalidFormat)?;
        let type_str = values.next().ok_or(LookupError::InvalidFormat)?;
        let start_str = values.next().ok_or(LookupError::InvalidFormat)?;
        let value_str = values.next().ok_or(LookupError::InvalidFormat)?;
        let _date = values.next();
        let status = values.next().unwrap_or("allocated");

        if type_str != "asn" || cc_str == "*" || start_str == "*" {
            return Ok(Line::Other);
        }
        if !matches!(status, "allocated" | "assigned") || cc_str.is_empty() || cc_str == "ZZ" {
            return Ok(Line::Other);
        }

        let registry = Registry::from_str(reg_str)?;
        let start = u32::from_str(start_str).map_err(|_| LookupError::InvalidFormat)?;
        let count = u32::from_str(value_str).map_err(|_| LookupError::InvalidFormat)?;

        Ok(Line::Asn(AsnDelegation {
            registry,
            cc: cc_str.to_string(),
            start,
            count,
        }))
    }
}

/// Counters from loading delegated-stats files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegatedStats {
    /// Files read
    pub files: usize,
    /// `asn` records indexed
    pub records: usize,
    /// Lines that did not fit the delegated-stats shape
    pub malformed: usize,
}

/// In-memory index of `asn` delegations across registries
#[derive(Debug, Default)]
pub struct DelegatedIndex {
    singles: HashMap<u32, Vec<AsnDelegation>>,
    ranges: Vec<AsnDelegation>,
    stats: DelegatedStats,
}

impl DelegatedIndex {
    /// Load every file under a directory (or a single file)
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut index = Self::default();
        for file in list_files(path)? {
            let reader = BufReader::new(File::open(&file).map_err(|e| Error::io(e, &file))?);
            index.add_reader(reader, &file)?;
        }
        tracing::info!(
            files = index.stats.files,
            records = index.stats.records,
            malformed = index.stats.malformed,
            "Loaded delegated-stats from {}",
            path.display()
        );
        Ok(index)
    }

    /// Index the lines of one delegated-stats file
    pub fn add_reader<R: BufRead>(&mut self, reader: R, origin: &Path) -> Result<()> {
        self.stats.files += 1;
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(e, origin))?;
            match Line::from_str(&line) {
                Ok(Line::Asn(delegation)) => self.insert(delegation),
                Ok(Line::Other) => {}
                Err(_) => self.stats.malformed += 1,
            }
        }
        Ok(())
    }

    fn insert(&mut self, delegation: AsnDelegation) {
        self.stats.records += 1;
        if delegation.count == 1 {
            self.singles
                .entry(delegation.start)
                .or_default()
                .push(delegation);
        } else if delegation.count > 1 {
            self.ranges.push(delegation);
        }
    }

    /// Countries and registries of every record covering the ASN
    pub fn lookup(&self, asn: u32) -> CountrySet {
        let mut set = CountrySet::default();
        let matches = self
            .singles
            .get(&asn)
            .into_iter()
            .flatten()
            .chain(self.ranges.iter().filter(|d| d.contains(asn)));
        for delegation in matches {
            set.insert_code(&delegation.cc);
            set.registries.insert(delegation.registry);
        }
        set
    }

    /// Load counters
    pub fn stats(&self) -> DelegatedStats {
        self.stats
    }
}

/// Files to read for a data path, sorted for a stable load order
pub(crate) fn list_files(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(path).map_err(|e| Error::io(e, path))?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut dirs = vec![path.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| Error::io(e, &dir))? {
            let entry = entry.map_err(|e| Error::io(e, &dir))?;
            let entry_path = entry.path();
            if entry_path.is_dir() {
                dirs.push(entry_path);
            } else {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Provider backed by locally held delegated-stats extracts
#[derive(Debug, Clone)]
pub struct WhoisProvider {
    index: Arc<DelegatedIndex>,
}

impl WhoisProvider {
    /// Create a provider over an already loaded index
    pub fn new(index: DelegatedIndex) -> Self {
        Self {
            index: Arc::new(index),
        }
    }

    /// Load the extracts found under `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(DelegatedIndex::from_path(path)?))
    }
}

#[async_trait]
impl CountryProvider for WhoisProvider {
    fn source(&self) -> Source {
        Source::Whois
    }

    async fn resolve(&self, asn: u32) -> Option<CountrySet> {
        let set = self.index.lookup(asn);
        (!set.is_empty()).then_some(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LACNIC: &str = "\
2|lacnic|20240101|1234|19870101|20240101|-0300
lacnic|*|asn|*|1000|summary
lacnic|BR|asn|64500|1|20050101|allocated
lacnic|AR|asn|64510|5|20060101|allocated
lacnic|BR|ipv4|200.160.0.0|4096|19980101|allocated
lacnic|ZZ|asn|64520|1||available
lacnic|BR|asn|notanumber|1|20050101|allocated
";

    const ARIN: &str = "\
arin|US|asn|64500|1|20010101|assigned|e5e3b9c13678dfc483fb1f819d70883c
";

    fn index(files: &[&str]) -> DelegatedIndex {
        let mut index = DelegatedIndex::default();
        for (i, text) in files.iter().enumerate() {
            let name = PathBuf::from(format!("delegated-{i}"));
            index.add_reader(Cursor::new(*text), &name).unwrap();
        }
        index
    }

    #[test]
    fn test_single_record_lookup() {
        let index = index(&[LACNIC]);
        let set = index.lookup(64500);
        assert_eq!(set.codes.iter().collect::<Vec<_>>(), vec!["br"]);
        assert!(set.registries.contains(&Registry::Lacnic));
    }

    #[test]
    fn test_range_record_lookup() {
        let index = index(&[LACNIC]);
        assert!(index.lookup(64514).codes.contains("ar"));
        assert!(index.lookup(64515).is_empty());
    }

    #[test]
    fn test_multiple_registries_yield_multiple_codes() {
        let index = index(&[LACNIC, ARIN]);
        let set = index.lookup(64500);
        assert_eq!(set.codes.len(), 2);
        assert!(set.codes.contains("br"));
        assert!(set.codes.contains("us"));
        assert_eq!(set.registries.len(), 2);
    }

    #[test]
    fn test_skips_non_asn_and_unassigned() {
        let index = index(&[LACNIC]);
        assert!(index.lookup(64520).is_empty());
        let stats = index.stats();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn test_missing_path_is_missing_input() {
        let err = DelegatedIndex::from_path(Path::new("/nonexistent/ixgeo/whois")).unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn test_from_path_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("delegated-lacnic-latest"), LACNIC).unwrap();
        std::fs::create_dir(dir.path().join("arin")).unwrap();
        std::fs::write(dir.path().join("arin").join("delegated-arin-extended-latest"), ARIN)
            .unwrap();
        let index = DelegatedIndex::from_path(dir.path()).unwrap();
        assert_eq!(index.stats().files, 2);
        assert_eq!(index.lookup(64500).codes.len(), 2);
    }

    #[tokio::test]
    async fn test_provider_empty_is_none() {
        let provider = WhoisProvider::new(index(&[LACNIC]));
        assert_eq!(provider.source(), Source::Whois);
        assert!(provider.resolve(64500).await.is_some());
        assert!(provider.resolve(99999).await.is_none());
    }
}
