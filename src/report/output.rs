//! Delimited output files

use super::aggregate::{AggregateRow, Summary};
use super::Report;
use crate::asn::{join_codes, AttributionResult};
use crate::error::{Error, Result};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One attribution as `AS64500|br us|whois`, or `AS99999|null|missing`
pub fn attribution_line(result: &AttributionResult) -> String {
    if result.is_missing() {
        format!("{}|null|missing", result.asn)
    } else {
        format!("{}|{}|{}", result.asn, join_codes(&result.country_codes), result.source)
    }
}

/// Attribution lines of the resolved results
pub fn format_attributions<'a>(results: impl IntoIterator<Item = &'a AttributionResult>) -> String {
    format_lines(results.into_iter().filter(|r| !r.is_missing()).map(attribution_line))
}

/// Attribution lines of the unresolved results
pub fn format_missing<'a>(results: impl IntoIterator<Item = &'a AttributionResult>) -> String {
    format_lines(results.into_iter().filter(|r| r.is_missing()).map(attribution_line))
}

/// `key|count` lines
pub fn format_summary(rows: &[AggregateRow]) -> String {
    format_lines(rows.iter().map(|r| format!("{}|{}", r.key, r.count)))
}

/// `region count` lines followed by a `total` line
pub fn format_regions(rows: &[AggregateRow]) -> String {
    let total: usize = rows.iter().map(|r| r.count).sum();
    format_lines(
        rows.iter()
            .map(|r| format!("{} {}", r.key, r.count))
            .chain(std::iter::once(format!("total {total}"))),
    )
}

fn format_lines(lines: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Writes a report's files into one directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Create the output directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::Io {
            source: e,
            context: format!("creating {}", dir.display()),
        })?;
        Ok(Self { dir })
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every file of the report, returning their paths
    pub fn write(&self, report: &Report) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for exchange in &report.exchanges {
            let results = report.results_for(exchange);
            written.push(self.write_file(
                &format!("{}.attribution", exchange.label),
                &format_attributions(results.iter().copied()),
            )?);
            written.push(self.write_file(
                &format!("{}.missing", exchange.label),
                &format_missing(results.iter().copied()),
            )?);
        }

        written.push(self.write_file("all.attribution", &format_attributions(&report.attributions))?);
        written.push(self.write_file("all.missing", &format_missing(&report.attributions))?);
        written.extend(self.write_summary(&report.summary, report.regions_available)?);

        tracing::info!(files = written.len(), "Wrote report to {}", self.dir.display());
        Ok(written)
    }

    fn write_summary(&self, summary: &Summary, with_regions: bool) -> Result<Vec<PathBuf>> {
        let mut written = vec![
            self.write_file("countries.summary", &format_summary(&summary.countries))?,
            self.write_file("rirs.summary", &format_summary(&summary.registries))?,
        ];
        if with_regions {
            written.push(self.write_file("regions.summary", &format_regions(&summary.regions))?);
        }
        Ok(written)
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let file = fs::File::create(&path).map_err(|e| Error::io(e, &path))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(contents.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| Error::io(e, &path))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::{CountrySet, Source};

    #[test]
    fn test_attribution_lines() {
        let resolved =
            AttributionResult::resolved("AS64500", Source::Whois, CountrySet::from_codes(["US", "br"]));
        assert_eq!(attribution_line(&resolved), "AS64500|br us|whois");
        assert_eq!(
            attribution_line(&AttributionResult::unresolved("AS99999")),
            "AS99999|null|missing"
        );
    }

    #[test]
    fn test_attribution_and_missing_split() {
        let results = vec![
            AttributionResult::resolved("AS1", Source::Cymru, CountrySet::from_codes(["nl"])),
            AttributionResult::unresolved("AS2"),
        ];
        assert_eq!(format_attributions(&results), "AS1|nl|cymru\n");
        assert_eq!(format_missing(&results), "AS2|null|missing\n");
    }

    #[test]
    fn test_summary_formats() {
        let rows = vec![AggregateRow::new("br", 3), AggregateRow::new("us", 1)];
        assert_eq!(format_summary(&rows), "br|3\nus|1\n");

        let regions = vec![AggregateRow::new("SP", 2), AggregateRow::new("na", 1)];
        assert_eq!(format_regions(&regions), "SP 2\nna 1\ntotal 3\n");
        assert_eq!(format_regions(&[]), "total 0\n");
        assert_eq!(format_summary(&[]), "");
    }

    #[test]
    fn test_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let writer = ReportWriter::new(&out).unwrap();
        let written = writer.write(&Report::default()).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["all.attribution", "all.missing", "countries.summary", "rirs.summary"]
        );
        assert!(out.join("countries.summary").exists());
    }
}
