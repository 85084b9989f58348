//! Live Athena tests.
//!
//! These run real (billable) queries. They are skipped unless
//! ATHENA_DATABASE and ATHENA_OUTPUT_LOCATION are set; AWS_REGION and
//! credentials come from the usual AWS environment.

use std::sync::Arc;

use tlc_athena::athena::{AthenaClient, QueryService, Value};
use tlc_athena::catalog::Catalog;
use tlc_athena::config::{AthenaConfig, AthenaSettings, QueryConfig};
use tlc_athena::error::ErrorKind;
use tlc_athena::query::QueryExecutor;
use tlc_athena::tools::ToolAdapter;

/// Helper to resolve live settings, or `None` to skip.
fn live_settings() -> Option<AthenaSettings> {
    std::env::var("ATHENA_DATABASE").ok()?;
    std::env::var("ATHENA_OUTPUT_LOCATION").ok()?;
    AthenaSettings::from_env(&AthenaConfig::default()).ok()
}

async fn live_adapter(max_rows: usize) -> Option<ToolAdapter> {
    let settings = live_settings()?;
    let client = AthenaClient::connect(&settings).await.ok()?;
    let executor = QueryExecutor::from_config(Arc::new(client), &QueryConfig::default());
    Some(ToolAdapter::new(
        Arc::new(Catalog::nyc_tlc()),
        executor,
        max_rows,
    ))
}

#[tokio::test]
async fn test_live_credentials() {
    let Some(settings) = live_settings() else {
        eprintln!("Skipping test: ATHENA_DATABASE / ATHENA_OUTPUT_LOCATION not set");
        return;
    };

    let client = AthenaClient::connect(&settings).await.unwrap();
    let identity = client.verify_credentials().await.unwrap();
    assert!(identity.starts_with("arn:"));
}

#[tokio::test]
async fn test_live_select_one() {
    let Some(adapter) = live_adapter(100).await else {
        eprintln!("Skipping test: ATHENA_DATABASE / ATHENA_OUTPUT_LOCATION not set");
        return;
    };

    let response = adapter.run_query("SELECT 1").await.unwrap();
    let result = response.result().unwrap();
    assert_eq!(result.columns.len(), 1);
    assert_eq!(result.rows, vec![vec![Value::Int(1)]]);
}

#[tokio::test]
async fn test_live_truncation() {
    let Some(adapter) = live_adapter(3).await else {
        eprintln!("Skipping test: ATHENA_DATABASE / ATHENA_OUTPUT_LOCATION not set");
        return;
    };

    let response = adapter
        .run_query("SELECT * FROM taxi_zones LIMIT 10")
        .await
        .unwrap();
    let result = response.result().unwrap();
    assert_eq!(result.row_count, 3);
    assert!(response.truncated());
}

#[tokio::test]
async fn test_live_unknown_column_fails() {
    let Some(adapter) = live_adapter(100).await else {
        eprintln!("Skipping test: ATHENA_DATABASE / ATHENA_OUTPUT_LOCATION not set");
        return;
    };

    let failure = adapter
        .run_query("SELECT no_such_column FROM taxi_zones")
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ErrorKind::QueryFailed);
    assert!(failure.message.contains("no_such_column"));
}
