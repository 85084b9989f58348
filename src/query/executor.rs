//! Query execution against the managed query service.
//!
//! Submits SQL, polls until the execution reaches a terminal state or the
//! wait bound elapses, then materializes the result set. Executions that
//! time out are left running on the service; nothing here cancels them.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::athena::{ExecutionState, QueryExecution, QueryResult, QueryService};
use crate::config::QueryConfig;
use crate::error::{Result, TlcError};

/// Fallback diagnostic when the service gives no reason for a failure.
const UNKNOWN_FAILURE: &str = "Unknown error";

/// A single query to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql: String,
    /// Maximum number of data rows to fetch.
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Runs queries to completion with a bounded, non-blocking poll loop.
#[derive(Clone)]
pub struct QueryExecutor {
    service: Arc<dyn QueryService>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl QueryExecutor {
    pub fn new(service: Arc<dyn QueryService>, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            service,
            poll_interval,
            max_wait,
        }
    }

    /// Creates an executor using the configured poll interval and wait bound.
    pub fn from_config(service: Arc<dyn QueryService>, config: &QueryConfig) -> Self {
        Self::new(service, config.poll_interval(), config.max_wait())
    }

    /// Returns a copy of this executor with a different wait bound.
    pub fn with_max_wait(&self, max_wait: Duration) -> Self {
        Self {
            max_wait,
            ..self.clone()
        }
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Executes a query and returns its results.
    ///
    /// Fails with `QueryFailed` (service diagnostic verbatim) when the
    /// execution fails or is cancelled, and with `Timeout` when no terminal
    /// state is observed within the wait bound.
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryResult> {
        let sql = request.sql.trim();
        if sql.is_empty() {
            return Err(TlcError::invalid_input("SQL must not be empty"));
        }

        let started = Instant::now();
        let execution_id = self.service.submit(sql).await?;
        info!("Submitted query {}", execution_id);
        debug!("SQL for {}: {}", execution_id, sql);

        let execution = self.wait_for_completion(&execution_id, started).await?;

        match execution.state {
            ExecutionState::Succeeded => {
                let result = self
                    .service
                    .fetch_results(&execution, request.limit)
                    .await?
                    .with_execution_time(started.elapsed());
                info!(
                    "Query {} succeeded: {} rows in {}ms",
                    execution_id,
                    result.row_count,
                    result.execution_time.as_millis()
                );
                Ok(result)
            }
            ExecutionState::Failed => {
                let reason = execution
                    .state_change_reason
                    .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                warn!("Query {} failed: {}", execution_id, reason);
                Err(TlcError::query_failed(reason))
            }
            ExecutionState::Cancelled => {
                let reason = execution
                    .state_change_reason
                    .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                warn!("Query {} was cancelled: {}", execution_id, reason);
                Err(TlcError::query_failed(format!("Query cancelled: {reason}")))
            }
            ExecutionState::Submitted | ExecutionState::Running => Err(TlcError::internal(
                format!("Execution {} left polling in state {}", execution_id, execution.state),
            )),
        }
    }

    /// Polls until terminal, yielding between attempts.
    async fn wait_for_completion(
        &self,
        execution_id: &str,
        started: Instant,
    ) -> Result<QueryExecution> {
        let mut execution = QueryExecution::submitted(execution_id);

        loop {
            let observed = self.service.status(execution_id).await?;
            if observed.state != execution.state {
                debug!("Query {} is {}", execution_id, observed.state);
            }
            execution.advance(observed)?;

            if execution.is_terminal() {
                return Ok(execution);
            }

            let waited = started.elapsed();
            if waited >= self.max_wait {
                warn!(
                    "Query {} still {} after {}ms; leaving it running",
                    execution_id,
                    execution.state,
                    waited.as_millis()
                );
                return Err(TlcError::timeout(execution_id, self.max_wait));
            }

            let remaining = self.max_wait - waited;
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }
}
