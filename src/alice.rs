//! Alice-LG looking glass route dumps
//!
//! A route server dump lists `imported` and `filtered` routes, each with
//! its network and BGP attributes. The origin is the last AS of the path.

use crate::bgp::{normalize_asn, OriginRecord, ParseStats};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoutesDump {
    imported: Vec<Route>,
    filtered: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    network: String,
    #[serde(default)]
    bgp: BgpInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BgpInfo {
    as_path: Vec<PathHop>,
}

/// AS path entries are numbers in most dumps and strings in some
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathHop {
    Number(u64),
    Text(String),
}

impl PathHop {
    fn label(&self) -> String {
        match self {
            PathHop::Number(n) => format!("AS{n}"),
            PathHop::Text(s) => normalize_asn(s),
        }
    }
}

/// Origin records and counters of one route dump
#[derive(Debug, Clone, Default)]
pub struct RouteImport {
    /// One record per route with a usable path
    pub records: Vec<OriginRecord>,
    /// `rows` counts routes; `malformed` those without network or path
    pub stats: ParseStats,
}

/// Import a route dump from a reader
pub fn import_reader<R: Read>(reader: R) -> Result<RouteImport> {
    let dump: RoutesDump = serde_json::from_reader(reader).map_err(|source| Error::Json {
        source,
        context: "reading route dump".to_string(),
    })?;

    let mut import = RouteImport::default();
    for route in dump.imported.iter().chain(dump.filtered.iter()) {
        import.stats.rows += 1;
        let network = route.network.trim();
        match route.bgp.as_path.last() {
            Some(hop) if !network.is_empty() => import.records.push(OriginRecord {
                network: network.to_string(),
                asn: hop.label(),
            }),
            _ => import.stats.malformed += 1,
        }
    }
    Ok(import)
}

/// Import a route dump file
pub fn import_path(path: &Path) -> Result<RouteImport> {
    let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
    import_reader(std::io::BufReader::new(file)).map_err(|e| match e {
        Error::Json { source, .. } => Error::Json {
            source,
            context: path.display().to_string(),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
  "imported": [
    {"network": "200.160.0.0/20", "bgp": {"as_path": [26162, 22548], "next_hop": "187.16.216.1"}},
    {"network": "2001:12ff::/32", "bgp": {"as_path": ["22548"]}}
  ],
  "filtered": [
    {"network": "10.0.0.0/8", "bgp": {"as_path": [64512]}},
    {"network": "192.0.2.0/24", "bgp": {"as_path": []}}
  ],
  "api": {"cache_status": {"cached_at": "2024-01-01T00:00:00Z"}}
}"#;

    #[test]
    fn test_import_uses_last_hop() {
        let import = import_reader(DUMP.as_bytes()).unwrap();
        let records: Vec<(&str, &str)> = import
            .records
            .iter()
            .map(|r| (r.network.as_str(), r.asn.as_str()))
            .collect();
        assert_eq!(
            records,
            vec![
                ("200.160.0.0/20", "AS22548"),
                ("2001:12ff::/32", "AS22548"),
                ("10.0.0.0/8", "AS64512"),
            ]
        );
        assert_eq!(import.stats.rows, 4);
        assert_eq!(import.stats.malformed, 1);
    }

    #[test]
    fn test_empty_dump() {
        let import = import_reader("{}".as_bytes()).unwrap();
        assert!(import.records.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            import_reader("not json".as_bytes()),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            import_path(Path::new("/nonexistent/routes.json")),
            Err(Error::MissingInput { .. })
        ));
    }
}
