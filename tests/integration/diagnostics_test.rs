//! Diagnostics runs end to end against the mock service.

use tlc_athena::athena::MockQueryService;
use tlc_athena::catalog::Catalog;
use std::io::Write;

use tlc_athena::config::{AthenaConfig, AthenaSettings, Config, QueryConfig};
use tlc_athena::diagnostics::{
    diagnose_config, run_diagnostics, CheckStatus, CHECK_CONFIGURATION, CHECK_CONNECTIVITY,
};

fn quick_config() -> QueryConfig {
    QueryConfig {
        max_rows: 100,
        poll_interval_ms: 1,
        max_wait_secs: 1,
    }
}

fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[tokio::test]
async fn test_valid_config_and_reachable_service_all_pass() {
    let settings = AthenaSettings::resolve(
        &AthenaConfig::default(),
        lookup(&[
            ("ATHENA_DATABASE", "nyc_tlc"),
            ("ATHENA_OUTPUT_LOCATION", "s3://tlc-results/"),
            ("AWS_REGION", "us-east-1"),
        ]),
    );
    let service = MockQueryService::new().with_tables(["gtp_tlc_data", "taxi_zones"]);

    let report = run_diagnostics(settings, &service, &Catalog::nyc_tlc(), &quick_config()).await;

    assert_eq!(report.checks.len(), 5);
    assert!(report.all_passed(), "{report}");
    assert!(report.to_string().ends_with("5/5 checks passed"));
}

#[tokio::test]
async fn test_missing_env_fails_configuration_and_skips_rest() {
    let settings = AthenaSettings::resolve(
        &AthenaConfig::default(),
        lookup(&[("AWS_REGION", "us-east-1")]),
    );
    let service = MockQueryService::new().with_tables(["gtp_tlc_data"]);

    let report = run_diagnostics(settings, &service, &Catalog::nyc_tlc(), &quick_config()).await;

    assert_eq!(report.checks[0].status, CheckStatus::Fail);
    assert!(report.checks[0].detail.contains("ATHENA_DATABASE"));
    assert!(report.checks[0].detail.contains("ATHENA_OUTPUT_LOCATION"));
    assert!(report.checks[1..]
        .iter()
        .all(|c| c.status == CheckStatus::Skipped && !c.detail.is_empty()));
    assert_ne!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_unreachable_service_fails_connectivity() {
    let settings = AthenaSettings::resolve(
        &AthenaConfig::default(),
        lookup(&[
            ("ATHENA_DATABASE", "nyc_tlc"),
            ("ATHENA_OUTPUT_LOCATION", "s3://tlc-results/"),
            ("AWS_REGION", "us-east-1"),
        ]),
    );
    let service = MockQueryService::new().unreachable("dispatch failure");

    let report = run_diagnostics(settings, &service, &Catalog::nyc_tlc(), &quick_config()).await;

    let statuses: Vec<CheckStatus> = report.checks.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CheckStatus::Pass,
            CheckStatus::Pass,
            CheckStatus::Fail,
            CheckStatus::Skipped,
            CheckStatus::Skipped,
        ]
    );
    assert!(report
        .get(CHECK_CONNECTIVITY)
        .unwrap()
        .detail
        .contains("dispatch failure"));
}

#[tokio::test]
async fn test_malformed_config_file_still_produces_report() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[query\nmax_rows = ").unwrap();
    let service = MockQueryService::new().with_tables(["gtp_tlc_data"]);

    let loaded = Config::load(file.path(), |_| None);
    let report = diagnose_config(
        loaded,
        lookup(&[
            ("ATHENA_DATABASE", "nyc_tlc"),
            ("ATHENA_OUTPUT_LOCATION", "s3://tlc-results/"),
            ("AWS_REGION", "us-east-1"),
        ]),
        &service,
    )
    .await;

    let configuration = report.get(CHECK_CONFIGURATION).unwrap();
    assert_eq!(configuration.status, CheckStatus::Fail);
    assert!(configuration.detail.contains("Configuration error in"));
    assert!(report.checks[1..]
        .iter()
        .all(|c| c.status == CheckStatus::Skipped));
    assert_eq!(report.exit_code(), 1);
    assert!(service.submitted_queries().is_empty());
}

#[tokio::test]
async fn test_bad_limit_override_still_produces_report() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Config::load(&dir.path().join("absent.toml"), lookup(&[("TLC_MAX_ROWS", "abc")]));
    let report = diagnose_config(loaded, |_| None, &MockQueryService::new()).await;

    assert_eq!(report.checks.len(), 5);
    assert!(report.checks[0].detail.contains("TLC_MAX_ROWS"));
}
