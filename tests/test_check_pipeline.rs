//! End-to-end tests for the full check pipeline over fixture stacks.

mod common;

use std::fs;
use tempfile::TempDir;

use stackcheck::check;
use stackcheck::config::Config;

use common::{write_compose, write_readme, write_template, HARDENED_PIHOLE};

#[test]
fn test_clean_stack_passes() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC"]);
    write_readme(tmp.path(), &["pihole"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    assert!(report.drift.missing.is_empty());
    assert!(report.drift.unused.is_empty());
    assert!(report.violations.is_empty());
    assert!(report.coverage.iter().all(|c| c.documented));
    assert!(report.pass);
}

#[test]
fn test_drift_scenario_missing_and_unused() {
    // Template declares DOMAIN and TZ; the single service references
    // DOMAIN and CF_TOKEN. Expected: missing = {CF_TOKEN}, unused = {TZ},
    // overall failure from the missing variable alone.
    let tmp = TempDir::new().unwrap();
    write_compose(
        tmp.path(),
        "docker-compose.yml",
        &["  tunnel:\n    image: cloudflare/cloudflared:2024.6.0\n    environment:\n      - DOMAIN=${DOMAIN}\n      - CF_TOKEN=${CF_TOKEN}\n"],
    );
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC"]);
    write_readme(tmp.path(), &["tunnel"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    assert_eq!(
        report.drift.missing.iter().collect::<Vec<_>>(),
        vec!["CF_TOKEN"]
    );
    assert_eq!(
        report.drift.unused.iter().collect::<Vec<_>>(),
        vec!["TZ"]
    );
    assert!(!report.pass);

    // Coverage and rule findings are computed independently of drift.
    assert_eq!(report.coverage.len(), 1);
    assert!(report.coverage[0].documented);
    assert!(report
        .violations
        .iter()
        .all(|v| v.service == "tunnel"));
}

#[test]
fn test_missing_variable_reported_once_across_manifests() {
    let tmp = TempDir::new().unwrap();
    let referencing_block =
        "  app:\n    image: app:1\n    environment:\n      - CF_TOKEN=${CF_TOKEN}\n";
    let other_block =
        "  worker:\n    image: worker:1\n    environment:\n      - CF_TOKEN=${CF_TOKEN}\n";
    write_compose(tmp.path(), "docker-compose.yml", &[referencing_block]);
    write_compose(tmp.path(), "docker-compose.worker.yml", &[other_block]);
    write_template(tmp.path(), &["DOMAIN=example.com"]);
    write_readme(tmp.path(), &["app", "worker"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    assert_eq!(report.drift.missing.len(), 1);
    assert!(report.drift.missing.contains("CF_TOKEN"));
}

#[test]
fn test_soft_findings_do_not_fail_the_run() {
    // No restart policy, no healthcheck, unused template variable: all
    // soft, so the run still passes.
    let tmp = TempDir::new().unwrap();
    write_compose(
        tmp.path(),
        "docker-compose.yml",
        &["  app:\n    image: app:1.0\n    container_name: app\n    security_opt:\n      - no-new-privileges:true\n"],
    );
    write_template(tmp.path(), &["UNUSED_EXTRA=1"]);
    write_readme(tmp.path(), &["app"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    assert!(!report.violations.is_empty());
    assert!(report.drift.unused.contains("UNUSED_EXTRA"));
    assert!(report.pass);
}

#[test]
fn test_undocumented_service_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC"]);
    write_readme(tmp.path(), &["traefik"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    let pihole = report
        .coverage
        .iter()
        .find(|c| c.service == "pihole")
        .unwrap();
    assert!(!pihole.documented);
    assert!(!report.pass);
}

#[test]
fn test_missing_template_is_fatal() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    write_readme(tmp.path(), &["pihole"]);

    assert!(check::run(tmp.path(), &Config::default()).is_err());
}

#[test]
fn test_broken_manifest_is_isolated() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    fs::write(
        tmp.path().join("docker-compose.broken.yml"),
        "services:\n  oops: [unclosed\n",
    )
    .unwrap();
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC"]);
    write_readme(tmp.path(), &["pihole"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    assert_eq!(report.issues.len(), 1);
    assert!(report
        .coverage
        .iter()
        .any(|c| c.service == "pihole" && c.documented));
    // A broken sibling manifest never blocks the run by itself.
    assert!(report.pass);
}

#[test]
fn test_template_issues_surface_in_report() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    write_template(
        tmp.path(),
        &["DOMAIN=example.com", "TZ=UTC", "TZ=duplicate", "not a line"],
    );
    write_readme(tmp.path(), &["pihole"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    assert_eq!(report.issues.len(), 2);
    assert!(report.pass);
}

#[test]
fn test_manifests_under_template_paths_are_ignored() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    fs::create_dir_all(tmp.path().join("service-templates")).unwrap();
    write_compose(
        tmp.path().join("service-templates").as_path(),
        "docker-compose.yml",
        &["  ghost:\n    image: ghost:5\n    environment:\n      - GHOST_URL=${GHOST_URL}\n"],
    );
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC"]);
    write_readme(tmp.path(), &["pihole"]);

    let report = check::run(tmp.path(), &Config::default()).unwrap();

    // The templated ghost service must contribute neither services nor
    // variable references.
    assert!(!report.drift.missing.contains("GHOST_URL"));
    assert!(report.coverage.iter().all(|c| c.service != "ghost"));
    assert!(report.pass);
}

#[test]
fn test_disabled_rule_is_suppressed() {
    let tmp = TempDir::new().unwrap();
    write_compose(
        tmp.path(),
        "docker-compose.yml",
        &["  app:\n    image: app:1.0\n"],
    );
    write_template(tmp.path(), &[]);
    write_readme(tmp.path(), &["app"]);
    fs::write(
        tmp.path().join("stackcheck.yml"),
        "rules:\n  disable:\n    - missing-restart-policy\n    - missing-healthcheck\n",
    )
    .unwrap();

    let config = Config::load(tmp.path()).unwrap();
    let report = check::run(tmp.path(), &config).unwrap();

    assert!(report
        .violations
        .iter()
        .all(|v| v.rule != "missing-restart-policy" && v.rule != "missing-healthcheck"));
    assert!(report
        .violations
        .iter()
        .any(|v| v.rule == "missing-container-identity"));
}

#[test]
fn test_commented_reference_policy() {
    let tmp = TempDir::new().unwrap();
    write_compose(
        tmp.path(),
        "docker-compose.yml",
        &["  app:\n    image: app:1.0\n    environment:\n      - DOMAIN=${DOMAIN}\n      # - CF_TOKEN=${CF_TOKEN}\n"],
    );
    write_template(tmp.path(), &["DOMAIN=example.com"]);
    write_readme(tmp.path(), &["app"]);

    // Default policy counts commented references.
    let default_report = check::run(tmp.path(), &Config::default()).unwrap();
    assert!(default_report.drift.missing.contains("CF_TOKEN"));

    // Opting out removes the commented reference from both sets.
    fs::write(
        tmp.path().join("stackcheck.yml"),
        "vars:\n  include_commented: false\n",
    )
    .unwrap();
    let config = Config::load(tmp.path()).unwrap();
    let strict_report = check::run(tmp.path(), &config).unwrap();
    assert!(!strict_report.drift.missing.contains("CF_TOKEN"));
}

#[test]
fn test_rerun_produces_identical_report() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    write_compose(
        tmp.path(),
        "docker-compose.media.yml",
        &["  jellyfin:\n    image: jellyfin/jellyfin:10.9\n    environment:\n      - MEDIA_PATH=${MEDIA_PATH}\n"],
    );
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC", "EXTRA=1"]);
    write_readme(tmp.path(), &["pihole"]);

    let config = Config::default();
    let first = check::run(tmp.path(), &config).unwrap();
    let second = check::run(tmp.path(), &config).unwrap();

    assert_eq!(first.render(), second.render());
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_indent_parser_backend_reaches_same_verdict() {
    let tmp = TempDir::new().unwrap();
    write_compose(tmp.path(), "docker-compose.yml", &[HARDENED_PIHOLE]);
    write_template(tmp.path(), &["DOMAIN=example.com", "TZ=UTC"]);
    write_readme(tmp.path(), &["pihole"]);
    fs::write(tmp.path().join("stackcheck.yml"), "scan:\n  parser: indent\n").unwrap();

    let config = Config::load(tmp.path()).unwrap();
    let report = check::run(tmp.path(), &config).unwrap();

    assert!(report.pass);
    assert_eq!(report.coverage.len(), 1);
}
