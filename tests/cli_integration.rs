//! Integration tests for the ixgeo CLI

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CAPTURE: &str = "\
route-server>show ip bgp
BGP table version is 1234, local router ID is 187.16.216.254
Status codes: s suppressed, d damped, h history, * valid, > best
Origin codes: i - IGP, e - EGP, ? - incomplete
   Network          Next Hop            Metric LocPrf Weight Path
*> 200.160.0.0/20   187.16.216.1                           0 22548 i
*                   187.16.217.4                           0 6939 22548 i
*  203.0.113.0/24   187.16.216.9                           0 {64500,64501} i
*> 198.51.100.0/24  187.16.216.10                          0 99999 i
route-server>";

const DELEGATED: &str = "\
2|lacnic|20240101|3|19870101|20240101|-0300
lacnic|*|asn|*|3|summary
lacnic|BR|asn|22548|1|20020618|allocated
lacnic|BR|asn|64500|1|20050101|assigned
ripencc|NL|asn|64501|1|20050101|allocated
";

fn ixgeo() -> Command {
    Command::cargo_bin("ixgeo").expect("Failed to find ixgeo binary")
}

/// Capture, whois extract, region registry and a config pointing at them
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("ixbr-sp.txt"), CAPTURE).unwrap();
    fs::create_dir(root.join("whois")).unwrap();
    fs::write(root.join("whois/delegated-lacnic-extended"), DELEGATED).unwrap();
    fs::write(root.join("registry.txt"), "22548|NIC.br|x|SP|Sao Paulo\n").unwrap();
    fs::write(
        root.join("ixgeo.toml"),
        r#"
[data]
whois_dir = "whois"
region_registry = "registry.txt"

[resolver]
live = false

[output]
dir = "out"

[[exchange]]
name = "ix.br"
location = "sp"
capture = "ixbr-sp.txt"
reference_prefixes = ["187.16.216.0/21"]

[[exchange]]
name = "de-cix"
capture = "missing.txt"
"#,
    )
    .unwrap();
    dir
}

fn config_arg(dir: &Path) -> String {
    dir.join("ixgeo.toml").display().to_string()
}

#[test]
fn test_help_output() {
    ixgeo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_version_output() {
    let output = ixgeo().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ixgeo "));
}

#[test]
fn test_parse_roa_set_and_continuation() {
    let dir = tempfile::tempdir().unwrap();
    let capture = dir.path().join("capture.txt");
    fs::write(
        &capture,
        "*  203.0.113.0/24          0 {64500,64501} i\n*                          0 64502 i\n",
    )
    .unwrap();

    ixgeo()
        .args(["parse", capture.to_str().unwrap(), "--prefix", "0"])
        .assert()
        .success()
        .stdout("AS64500\nAS64501\nAS64502\n");

    ixgeo()
        .args(["parse", capture.to_str().unwrap(), "--prefix", "0", "--networks"])
        .assert()
        .success()
        .stdout("203.0.113.0/24\n");
}

#[test]
fn test_parse_missing_capture_fails() {
    ixgeo()
        .args(["parse", "/nonexistent/capture.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing input"));
}

#[test]
fn test_resolve_offline() {
    let dir = fixture();
    ixgeo()
        .args(["--config", &config_arg(dir.path())])
        .args(["resolve", "--offline", "64500", "AS99999", "as22548"])
        .assert()
        .success()
        .stdout("AS22548|br|whois\nAS64500|br|whois\nAS99999|null|missing\n");
}

#[test]
fn test_resolve_without_providers_is_missing() {
    ixgeo()
        .args(["resolve", "--offline", "AS99999"])
        .assert()
        .success()
        .stdout("AS99999|null|missing\n");
}

#[test]
fn test_report_requires_config() {
    ixgeo()
        .args(["report", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn test_report_writes_files() {
    let dir = fixture();
    ixgeo()
        .args(["--config", &config_arg(dir.path()), "report", "--offline"])
        .assert()
        .success();

    let out = dir.path().join("out");
    let read = |name: &str| fs::read_to_string(out.join(name)).unwrap();
    assert_eq!(
        read("ix.br-sp.attribution"),
        "AS22548|br|whois\nAS64500|br|whois\nAS64501|nl|whois\n"
    );
    assert_eq!(read("ix.br-sp.missing"), "AS99999|null|missing\n");
    assert_eq!(read("all.missing"), "AS99999|null|missing\n");
    assert_eq!(read("countries.summary"), "br|2\nnl|1\n");
    assert_eq!(read("rirs.summary"), "lacnic|2\nripencc|1\n");
    assert_eq!(read("regions.summary"), "SP 1\nna 1\ntotal 2\n");
    assert!(!out.join("de-cix.attribution").exists());
}

#[test]
fn test_report_json_and_ascending() {
    let dir = fixture();
    let output_dir = dir.path().join("json-out");
    let output = ixgeo()
        .args(["--config", &config_arg(dir.path())])
        .args(["report", "--offline", "--json", "--ascending", "--output"])
        .arg(&output_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["exchanges"].as_array().unwrap().len(), 1);
    assert_eq!(json["failed"][0]["label"], "de-cix");
    assert_eq!(json["summary"]["countries"][0]["key"], "nl");
    assert_eq!(json["summary"]["missing"][0], "AS99999");
    assert!(output_dir.join("countries.summary").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[resolver]\nworkers = 0\n").unwrap();
    ixgeo()
        .args(["--config", path.to_str().unwrap(), "report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workers"));
}
