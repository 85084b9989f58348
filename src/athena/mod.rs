//! Managed query service boundary.
//!
//! Provides a trait-based interface to the query service so the executor
//! and diagnostics can run against Athena or an in-memory mock.

mod client;
mod mock;
mod types;

pub use client::{classify_error_code, AthenaClient, AthenaConnector};
pub use mock::MockQueryService;
pub use types::{
    ColumnInfo, ExecutionState, QueryExecution, QueryResult, Row, StatementKind, Value,
};

use crate::config::AthenaSettings;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Athena returns at most this many rows per results page.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Client contract of the managed query service.
///
/// Implementations must be safe to share across concurrent tool calls.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submits SQL for asynchronous execution and returns the execution id.
    async fn submit(&self, sql: &str) -> Result<String>;

    /// Fetches the current state of an execution.
    async fn status(&self, execution_id: &str) -> Result<QueryExecution>;

    /// Reads up to `limit` data rows of a succeeded execution.
    async fn fetch_results(
        &self,
        execution: &QueryExecution,
        limit: Option<usize>,
    ) -> Result<QueryResult>;

    /// Checks that the configured credentials are accepted and returns the
    /// caller identity.
    async fn verify_credentials(&self) -> Result<String>;
}

/// Builds a query service from resolved settings.
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect(&self, settings: &AthenaSettings) -> Result<Arc<dyn QueryService>>;
}
