//! Country lookup from a CC2ASN dataset
//!
//! The dataset is a directory tree holding one `<CC>_ASN` file per
//! country, each listing that country's ASNs one per line. The country
//! code comes from the file name, never from the file content.

use super::provider::{CountryProvider, CountrySet, Source};
use super::whois::list_files;
use crate::bgp::asn_number;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

const ASN_FILE_SUFFIX: &str = "_asn";

/// ASN to country index built from a CC2ASN tree
#[derive(Debug, Default)]
pub struct Cc2AsnIndex {
    countries: HashMap<u32, BTreeSet<String>>,
    malformed: usize,
}

impl Cc2AsnIndex {
    /// Load every `<CC>_ASN` file under `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut index = Self::default();
        let mut files = 0;
        for file in list_files(path)? {
            let Some(cc) = country_of(&file) else {
                continue;
            };
            let handle = std::fs::File::open(&file).map_err(|e| Error::io(e, &file))?;
            index.add_reader(&cc, BufReader::new(handle), &file)?;
            files += 1;
        }
        tracing::info!(
            files,
            asns = index.countries.len(),
            malformed = index.malformed,
            "Loaded CC2ASN dataset from {}",
            path.display()
        );
        Ok(index)
    }

    /// Index the ASNs listed for one country
    pub fn add_reader<R: BufRead>(&mut self, cc: &str, reader: R, origin: &Path) -> Result<()> {
        let cc = cc.to_ascii_lowercase();
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(e, origin))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match asn_number(line) {
                Some(asn) => {
                    self.countries.entry(asn).or_default().insert(cc.clone());
                }
                None => self.malformed += 1,
            }
        }
        Ok(())
    }

    /// Countries listing the ASN
    pub fn lookup(&self, asn: u32) -> CountrySet {
        self.countries
            .get(&asn)
            .map(CountrySet::from_codes)
            .unwrap_or_default()
    }

    /// Lines that were not an ASN
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

/// Country code encoded in a `<CC>_ASN` file name
fn country_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    let cc = name.strip_suffix(ASN_FILE_SUFFIX)?;
    (cc.len() >= 2 && cc.chars().all(|c| c.is_ascii_alphabetic())).then(|| cc.to_string())
}

/// Provider backed by a locally held CC2ASN dataset
#[derive(Debug, Clone)]
pub struct Cc2AsnProvider {
    index: Arc<Cc2AsnIndex>,
}

impl Cc2AsnProvider {
    /// Create a provider over an already loaded index
    pub fn new(index: Cc2AsnIndex) -> Self {
        Self {
            index: Arc::new(index),
        }
    }

    /// Load the dataset found under `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(Cc2AsnIndex::from_path(path)?))
    }
}

#[async_trait]
impl CountryProvider for Cc2AsnProvider {
    fn source(&self) -> Source {
        Source::Cc2asn
    }

    async fn resolve(&self, asn: u32) -> Option<CountrySet> {
        let set = self.index.lookup(asn);
        (!set.is_empty()).then_some(set)
    }
}
