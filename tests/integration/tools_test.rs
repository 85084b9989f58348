//! Tool adapter behavior against the mock query service.

use std::sync::Arc;
use std::time::Duration;

use tlc_athena::athena::{ColumnInfo, MockQueryService, QueryResult, Value};
use tlc_athena::catalog::{Catalog, TableSchema};
use tlc_athena::error::ErrorKind;
use tlc_athena::query::QueryExecutor;
use tlc_athena::tools::{QueryResponse, ToolAdapter, ToolCall};

fn adapter_with(service: MockQueryService, catalog: Catalog, max_rows: usize) -> ToolAdapter {
    let executor = QueryExecutor::new(
        Arc::new(service),
        Duration::from_millis(1),
        Duration::from_millis(200),
    );
    ToolAdapter::new(Arc::new(catalog), executor, max_rows)
}

fn trips_catalog() -> Catalog {
    Catalog::new(vec![TableSchema::new(
        "trips",
        "Completed trips",
        ["pickup_time", "dropoff_time", "fare"],
    )])
    .unwrap()
}

fn numbered_rows(n: i64) -> QueryResult {
    QueryResult::with_data(
        vec![ColumnInfo::new("n", "integer")],
        (0..n).map(|i| vec![Value::Int(i)]).collect(),
    )
}

#[tokio::test]
async fn test_run_query_select_one() {
    let adapter = adapter_with(MockQueryService::new(), Catalog::nyc_tlc(), 100);

    let response = adapter.run_query("SELECT 1").await.unwrap();
    let result = response.result().expect("rows");

    assert_eq!(result.columns.len(), 1);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert!(!response.truncated());
}

#[tokio::test]
async fn test_describe_table_returns_ordered_columns() {
    let adapter = adapter_with(MockQueryService::new(), trips_catalog(), 100);

    assert_eq!(
        adapter.describe_table("trips").unwrap(),
        vec!["pickup_time", "dropoff_time", "fare"]
    );
}

#[tokio::test]
async fn test_describe_every_catalog_table() {
    let catalog = Catalog::nyc_tlc();
    let names: Vec<String> = catalog.table_names().iter().map(|s| s.to_string()).collect();
    let adapter = adapter_with(MockQueryService::new(), catalog, 100);

    for name in names {
        assert!(!adapter.describe_table(&name).unwrap().is_empty(), "{name}");
    }

    let failure = adapter.describe_table("yellow_tripdata").unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_tables_is_deterministic() {
    let adapter = adapter_with(MockQueryService::new(), Catalog::nyc_tlc(), 100);

    let first = adapter.list_tables();
    let second = adapter.list_tables();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].name, "gtp_tlc_data");
}

#[tokio::test]
async fn test_truncation_flag_iff_rows_exceed_max() {
    for (available, max_rows, expect_truncated) in
        [(3, 5, false), (5, 5, false), (6, 5, true), (50, 5, true)]
    {
        let service = MockQueryService::new().with_result("from big", numbered_rows(available));
        let adapter = adapter_with(service, Catalog::nyc_tlc(), max_rows);

        let response = adapter.run_query("SELECT n FROM big").await.unwrap();
        let result = response.result().unwrap();

        assert!(result.row_count <= max_rows);
        assert_eq!(
            response.truncated(),
            expect_truncated,
            "{available} rows with max {max_rows}"
        );
    }
}

#[tokio::test]
async fn test_failed_query_preserves_diagnostic() {
    let diagnostic = "SYNTAX_ERROR: line 1:8: Column 'tip' cannot be resolved";
    let service = MockQueryService::new().with_failure("tip", diagnostic);
    let adapter = adapter_with(service, Catalog::nyc_tlc(), 100);

    let failure = adapter
        .run_query("SELECT tip FROM gtp_tlc_data")
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ErrorKind::QueryFailed);
    assert_eq!(failure.message, diagnostic);
}

#[tokio::test]
async fn test_timeout_is_reported_not_raised() {
    let service = MockQueryService::new().with_hang("slow");
    let adapter = adapter_with(service, Catalog::nyc_tlc(), 100);

    let reply = adapter
        .call(ToolCall::RunQuery("SELECT * FROM slow".to_string()))
        .await;
    assert!(reply.is_error);
    assert!(reply.text.contains("Error (Timeout)"));
}

#[tokio::test]
async fn test_question_returns_guidance_without_submitting() {
    let service = MockQueryService::new();
    let adapter = adapter_with(service.clone(), Catalog::nyc_tlc(), 100);

    let response = adapter
        .run_query("How many yellow cab trips were there in January?")
        .await
        .unwrap();

    assert!(matches!(response, QueryResponse::Guidance(_)));
    assert!(response.to_text().contains("gtp_tlc_data"));
    assert!(service.submitted_queries().is_empty());
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let service = MockQueryService::new()
        .with_polls_before_completion(2)
        .with_failure("broken", "boom");
    let adapter = adapter_with(service.clone(), Catalog::nyc_tlc(), 100);

    let (ok, failed, described) = tokio::join!(
        adapter.call(ToolCall::RunQuery("SELECT 1".to_string())),
        adapter.call(ToolCall::RunQuery("SELECT * FROM broken".to_string())),
        adapter.call(ToolCall::DescribeTable("taxi_zones".to_string())),
    );

    assert!(!ok.is_error);
    assert!(failed.is_error);
    assert!(failed.text.ends_with("Error (QueryFailed): boom"));
    assert!(!described.is_error);
    assert_eq!(service.submitted_queries().len(), 2);
}
