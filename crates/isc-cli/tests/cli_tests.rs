use isc_cli::report::Report;
use isc_cli::site::SiteDump;
use isc_cli::{build_cli, run};
use isc_meta::{keys, EntityId, MetaStore};
use isc_test_utils::{content_with, site_with_assets};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn write_site(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("site.json");
    let site = site_with_assets([10, 11, 12])
        .with_post(1, content_with(&[10, 11]))
        .with_typed_post(2, "page", content_with(&[11]));
    SiteDump {
        site,
        meta: Default::default(),
    }
    .save(&path)
    .unwrap();
    path
}

fn exec(site: &Path, args: &[&str]) -> (Report, String) {
    let mut argv = vec!["isc", "--site", site.to_str().unwrap()];
    argv.extend_from_slice(args);
    let matches = build_cli().try_get_matches_from(argv).unwrap();
    let mut out = Vec::new();
    let report = run(&matches, &mut out).unwrap();
    (report, String::from_utf8(out).unwrap())
}

#[test]
fn test_reindex_writes_dump_back() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);

    let (report, text) = exec(&site, &["reindex"]);

    assert!(!report.has_failures());
    assert!(text.contains("Indexed: 2"));
    let dump = SiteDump::load(&site).unwrap();
    assert_eq!(
        dump.meta.get_meta(EntityId::new(11), keys::IMAGE_CONTENTS).unwrap(),
        Some(json!([1, 2]))
    );
}

#[test]
fn test_dry_run_leaves_dump_alone() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);

    exec(&site, &["reindex", "--dry-run"]);

    assert!(SiteDump::load(&site).unwrap().meta.is_empty());
}

#[test]
fn test_reindex_single_post() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);

    exec(&site, &["reindex", "--post", "2"]);

    let dump = SiteDump::load(&site).unwrap();
    assert!(dump.meta.get_meta(EntityId::new(1), keys::CONTENT_IMAGES).unwrap().is_none());
    assert!(dump.meta.get_meta(EntityId::new(2), keys::CONTENT_IMAGES).unwrap().is_some());
}

#[test]
fn test_reindex_unknown_post_fails() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);
    let matches = build_cli()
        .try_get_matches_from(["isc", "--site", site.to_str().unwrap(), "reindex", "--post", "99"])
        .unwrap();

    let err = run(&matches, &mut Vec::new()).unwrap_err();

    assert!(format!("{err:#}").contains("unknown content item 99"));
}

#[test]
fn test_relations_json() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);
    exec(&site, &["reindex"]);

    let (_, out) = exec(&site, &["relations", "--direction", "images", "--json"]);

    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        value,
        json!({
            "command": "image-relations",
            "result": [
                {"image": 10, "contents": [1]},
                {"image": 11, "contents": [1, 2]},
            ]
        })
    );
}

#[test]
fn test_missing_then_init_fields() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);

    let (report, _) = exec(&site, &["missing"]);
    let Report::Missing { missing, unused } = report else {
        panic!("wrong report");
    };
    assert!(missing.is_empty());
    assert_eq!(unused.len(), 3);

    exec(&site, &["init-fields"]);
    let (report, _) = exec(&site, &["missing"]);
    let Report::Missing { missing, unused } = report else {
        panic!("wrong report");
    };
    assert_eq!(missing.len(), 3);
    assert!(unused.is_empty());
}

#[test]
fn test_clear_and_verify() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);
    exec(&site, &["reindex"]);

    let (report, _) = exec(&site, &["verify"]);
    assert!(!report.has_failures());

    let (_, text) = exec(&site, &["clear-index"]);
    assert_eq!(text, "Removed 4 index entries\n");
    assert!(SiteDump::load(&site).unwrap().meta.is_empty());
}

#[test]
fn test_options_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let site = write_site(&dir);
    let config = dir.path().join("isc.toml");
    std::fs::write(&config, "excluded_post_types = [\"attachment\", \"revision\", \"page\"]\n").unwrap();

    let (report, _) = exec(&site, &["--config", config.to_str().unwrap(), "reindex"]);

    let Report::Reindex(summary) = report else {
        panic!("wrong report");
    };
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_missing_site_file() {
    let dir = TempDir::new().unwrap();
    let matches = build_cli()
        .try_get_matches_from(["isc", "--site", dir.path().join("nope.json").to_str().unwrap(), "verify"])
        .unwrap();

    let err = run(&matches, &mut Vec::new()).unwrap_err();

    assert!(err.to_string().contains("failed to read site dump"));
}
