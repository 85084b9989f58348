//! Config file loading and catalog overrides.

use std::io::Write;

use tlc_athena::config::Config;
use tlc_athena::error::ErrorKind;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_file_uses_builtin_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();

    let catalog = config.catalog().unwrap();
    assert_eq!(catalog.table_names(), vec!["gtp_tlc_data", "taxi_zones"]);
    assert_eq!(config.query.max_rows, 100);
}

#[test]
fn test_file_tables_replace_builtin_catalog() {
    let file = write_config(
        r#"
[athena]
database = "tlc_dev"

[query]
max_rows = 25

[[tables]]
name = "trips"
description = "Completed trips"
columns = ["pickup_time", "dropoff_time", "fare"]
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.athena.database.as_deref(), Some("tlc_dev"));
    assert_eq!(config.query.max_rows, 25);
    assert_eq!(config.query.poll_interval_ms, 1000);

    let catalog = config.catalog().unwrap();
    assert_eq!(
        catalog.get("trips").unwrap().columns,
        vec!["pickup_time", "dropoff_time", "fare"]
    );
    assert!(catalog.get("taxi_zones").is_none());
}

#[test]
fn test_duplicate_tables_rejected() {
    let file = write_config(
        r#"
[[tables]]
name = "trips"
description = "a"
columns = ["id"]

[[tables]]
name = "trips"
description = "b"
columns = ["id"]
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    let err = config.catalog().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[test]
fn test_malformed_toml_names_file() {
    let file = write_config("[query\nmax_rows = ");
    let err = Config::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains(&file.path().display().to_string()));
}
