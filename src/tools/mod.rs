//! Host-facing tool operations.
//!
//! Exposes `list_tables`, `describe_table`, and `run_query`. Each call is
//! independent; the adapter only holds read-only state, so calls may run
//! concurrently. Domain errors are returned as [`ToolFailure`] values and
//! never escape as faults.

pub mod definitions;
pub mod format;

pub use definitions::{
    get_tool_definitions, DescribeTableInput, RunQueryInput, ToolDefinition, DESCRIBE_TABLE,
    LIST_TABLES, RUN_QUERY,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::athena::QueryResult;
use crate::catalog::Catalog;
use crate::error::{ErrorKind, Result, TlcError};
use crate::prompt;
use crate::query::{classify_input, InputKind, QueryExecutor, QueryRequest};

/// A structured failure reported back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<TlcError> for ToolFailure {
    fn from(err: TlcError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message(),
        }
    }
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Catalog entry returned by `list_tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub description: String,
}

/// Successful `run_query` outcome.
#[derive(Debug, Clone)]
pub enum QueryResponse {
    /// The SQL ran; rows are capped at the configured maximum.
    Rows { sql: String, result: QueryResult },
    /// The input was a question, so schema guidance was returned instead.
    Guidance(String),
}

impl QueryResponse {
    /// True when rows beyond the configured maximum were dropped.
    pub fn truncated(&self) -> bool {
        matches!(self, Self::Rows { result, .. } if result.was_truncated)
    }

    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            Self::Rows { result, .. } => Some(result),
            Self::Guidance(_) => None,
        }
    }

    /// Renders the response text for the host.
    pub fn to_text(&self) -> String {
        match self {
            Self::Rows { sql, result } => format::format_query_success(sql, result),
            Self::Guidance(text) => text.clone(),
        }
    }
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ListTables,
    DescribeTable(String),
    RunQuery(String),
}

impl ToolCall {
    /// Parses a tool name and its JSON arguments.
    ///
    /// Unknown names and malformed arguments are `InvalidInput`.
    pub fn parse(name: &str, arguments: Option<Map<String, JsonValue>>) -> Result<Self> {
        let arguments = JsonValue::Object(arguments.unwrap_or_default());
        match name {
            LIST_TABLES => Ok(Self::ListTables),
            DESCRIBE_TABLE => {
                let input: DescribeTableInput = serde_json::from_value(arguments)
                    .map_err(|e| TlcError::invalid_input(format!("bad arguments: {e}")))?;
                Ok(Self::DescribeTable(input.table))
            }
            RUN_QUERY => {
                let input: RunQueryInput = serde_json::from_value(arguments)
                    .map_err(|e| TlcError::invalid_input(format!("bad arguments: {e}")))?;
                Ok(Self::RunQuery(input.sql))
            }
            other => Err(TlcError::invalid_input(format!("Unknown tool: {other}"))),
        }
    }
}

/// Text reply for one tool call, flagged when it describes a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn error(text: String) -> Self {
        Self {
            text,
            is_error: true,
        }
    }
}

/// Binds the catalog and the executor to the three host operations.
#[derive(Clone)]
pub struct ToolAdapter {
    catalog: Arc<Catalog>,
    executor: QueryExecutor,
    max_rows: usize,
}

impl ToolAdapter {
    pub fn new(catalog: Arc<Catalog>, executor: QueryExecutor, max_rows: usize) -> Self {
        Self {
            catalog,
            executor,
            max_rows: max_rows.max(1),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Tool definitions for the host, derived from the catalog and row cap.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        get_tool_definitions(&self.catalog.table_names(), self.max_rows)
    }

    /// Every catalog table's name and description, in catalog order.
    pub fn list_tables(&self) -> Vec<TableSummary> {
        self.catalog
            .tables()
            .iter()
            .map(|t| TableSummary {
                name: t.name.clone(),
                description: t.description.clone(),
            })
            .collect()
    }

    /// The ordered column list of `name`.
    pub fn describe_table(&self, name: &str) -> std::result::Result<Vec<String>, ToolFailure> {
        let name = name.trim();
        self.catalog
            .get(name)
            .map(|t| t.columns.clone())
            .ok_or_else(|| TlcError::not_found(name).into())
    }

    /// Runs SQL and caps the returned rows at the configured maximum.
    ///
    /// One extra row is requested so truncation is flagged only when more
    /// rows really existed.
    pub async fn run_query(&self, sql: &str) -> std::result::Result<QueryResponse, ToolFailure> {
        if sql.trim().is_empty() {
            return Err(TlcError::invalid_input("SQL must not be empty").into());
        }

        if let InputKind::NaturalLanguage = classify_input(sql) {
            debug!("run_query received a question; returning schema guidance");
            return Ok(QueryResponse::Guidance(prompt::natural_language_guidance(
                sql,
                &self.catalog,
            )));
        }

        let request = QueryRequest::new(sql.trim()).with_limit(self.max_rows.saturating_add(1));
        let mut result = self.executor.execute(&request).await?;
        result.truncate(self.max_rows);
        if result.was_truncated {
            info!("Result truncated to {} rows", self.max_rows);
        }

        Ok(QueryResponse::Rows {
            sql: sql.trim().to_string(),
            result,
        })
    }

    /// Runs a parsed tool call and renders the reply text.
    pub async fn call(&self, call: ToolCall) -> ToolReply {
        match call {
            ToolCall::ListTables => ToolReply::ok(to_pretty_json(&self.list_tables())),
            ToolCall::DescribeTable(table) => match self.describe_table(&table) {
                Ok(columns) => {
                    let description = self
                        .catalog
                        .get(table.trim())
                        .map(|t| t.description.clone())
                        .unwrap_or_default();
                    ToolReply::ok(to_pretty_json(&serde_json::json!({
                        "name": table.trim(),
                        "description": description,
                        "columns": columns,
                    })))
                }
                Err(failure) => ToolReply::error(failure.to_string()),
            },
            ToolCall::RunQuery(sql) => match self.run_query(&sql).await {
                Ok(response) => ToolReply::ok(response.to_text()),
                Err(failure) => ToolReply::error(format::format_query_failure(
                    &sql,
                    failure.kind,
                    &failure.message,
                )),
            },
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athena::{ColumnInfo, MockQueryService, Value};
    use crate::catalog::TableSchema;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn adapter_with(service: &MockQueryService, max_rows: usize) -> ToolAdapter {
        let executor = QueryExecutor::new(
            Arc::new(service.clone()),
            Duration::from_millis(1),
            Duration::from_millis(200),
        );
        ToolAdapter::new(Arc::new(Catalog::nyc_tlc()), executor, max_rows)
    }

    fn numbers(count: i64) -> QueryResult {
        QueryResult::with_data(
            vec![ColumnInfo::new("n", "integer")],
            (0..count).map(|i| vec![Value::Int(i)]).collect(),
        )
    }

    #[test]
    fn test_list_tables_is_stable() {
        let adapter = adapter_with(&MockQueryService::new(), 100);
        let first = adapter.list_tables();
        assert_eq!(first, adapter.list_tables());
        assert_eq!(first[0].name, "gtp_tlc_data");
        assert_eq!(first[1].name, "taxi_zones");
    }

    #[test]
    fn test_describe_table() {
        let executor = QueryExecutor::new(
            Arc::new(MockQueryService::new()),
            Duration::from_millis(1),
            Duration::from_millis(10),
        );
        let catalog = Catalog::new(vec![TableSchema::new(
            "trips",
            "Trip records",
            ["pickup_time", "dropoff_time", "fare"],
        )])
        .unwrap();
        let adapter = ToolAdapter::new(Arc::new(catalog), executor, 10);

        assert_eq!(
            adapter.describe_table("trips").unwrap(),
            vec!["pickup_time", "dropoff_time", "fare"]
        );
        let failure = adapter.describe_table("zones").unwrap_err();
        assert_eq!(failure.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_run_query_truncates_over_cap() {
        let service = MockQueryService::new().with_result("numbers", numbers(12));
        let adapter = adapter_with(&service, 10);

        let response = adapter.run_query("SELECT n FROM numbers").await.unwrap();
        assert!(response.truncated());
        assert_eq!(response.result().unwrap().row_count, 10);
        assert!(response.to_text().contains("Result truncated"));
    }

    #[tokio::test]
    async fn test_run_query_exactly_at_cap_is_not_truncated() {
        let service = MockQueryService::new().with_result("numbers", numbers(10));
        let adapter = adapter_with(&service, 10);

        let response = adapter.run_query("SELECT n FROM numbers").await.unwrap();
        assert!(!response.truncated());
        assert_eq!(response.result().unwrap().row_count, 10);
    }

    #[tokio::test]
    async fn test_run_query_with_unbounded_cap() {
        let service = MockQueryService::new().with_result("numbers", numbers(3));
        let adapter = adapter_with(&service, usize::MAX);

        let response = adapter.run_query("SELECT n FROM numbers").await.unwrap();
        assert!(!response.truncated());
        assert_eq!(response.result().unwrap().row_count, 3);
    }

    #[tokio::test]
    async fn test_run_query_question_is_not_submitted() {
        let service = MockQueryService::new();
        let adapter = adapter_with(&service, 10);

        let response = adapter
            .run_query("Which borough has the most pickups?")
            .await
            .unwrap();
        assert!(matches!(response, QueryResponse::Guidance(_)));
        assert!(service.submitted_queries().is_empty());
    }

    #[tokio::test]
    async fn test_run_query_failure_is_structured() {
        let service = MockQueryService::new().with_failure("bogus", "TABLE_NOT_FOUND: bogus");
        let adapter = adapter_with(&service, 10);

        let failure = adapter
            .run_query("SELECT * FROM bogus")
            .await
            .unwrap_err();
        assert_eq!(
            failure,
            ToolFailure {
                kind: ErrorKind::QueryFailed,
                message: "TABLE_NOT_FOUND: bogus".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_call_reports_errors_as_replies() {
        let adapter = adapter_with(&MockQueryService::new(), 10);

        let reply = adapter
            .call(ToolCall::DescribeTable("nope".to_string()))
            .await;
        assert!(reply.is_error);
        assert_eq!(reply.text, "NotFound: unknown table 'nope'");

        let reply = adapter.call(ToolCall::ListTables).await;
        assert!(!reply.is_error);
        assert!(reply.text.contains("\"taxi_zones\""));
    }

    #[test]
    fn test_parse_tool_calls() {
        let args = serde_json::json!({"sql": "SELECT 1"});
        let call = ToolCall::parse(RUN_QUERY, args.as_object().cloned()).unwrap();
        assert_eq!(call, ToolCall::RunQuery("SELECT 1".to_string()));

        assert_eq!(ToolCall::parse(LIST_TABLES, None).unwrap(), ToolCall::ListTables);

        let err = ToolCall::parse(DESCRIBE_TABLE, None).unwrap_err();
        assert!(err.to_string().contains("bad arguments"));

        let err = ToolCall::parse("drop_everything", None).unwrap_err();
        assert_eq!(err.message(), "Unknown tool: drop_everything");
    }
}
