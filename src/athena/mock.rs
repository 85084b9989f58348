//! Mock query service for testing.
//!
//! Scripted in-memory stand-in for Athena. Executions run for a
//! configurable number of polls and then reach the outcome registered for
//! the first matching SQL pattern.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    ColumnInfo, ExecutionState, QueryExecution, QueryResult, QueryService, ServiceConnector,
    StatementKind, Value,
};
use crate::config::AthenaSettings;
use crate::error::{Result, TlcError};

#[derive(Debug, Clone)]
enum Outcome {
    Succeed(QueryResult),
    Fail(String),
    Cancel(String),
    Hang,
}

#[derive(Debug)]
struct Execution {
    sql: String,
    outcome: Outcome,
    polls: usize,
}

#[derive(Debug, Default)]
struct MockState {
    scripted: Vec<(String, Outcome)>,
    tables: Vec<String>,
    polls_before_completion: usize,
    auth_failure: Option<String>,
    unreachable: Option<String>,
    executions: HashMap<String, Execution>,
    next_id: u64,
    submitted: Vec<String>,
    status_calls: usize,
}

/// A mock query service that returns predefined results.
///
/// Clones share state, so a test can keep a handle for inspection after
/// handing the service to an executor.
#[derive(Debug, Clone, Default)]
pub struct MockQueryService {
    state: Arc<Mutex<MockState>>,
}

impl MockQueryService {
    /// Creates a mock that completes every query on the first poll.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Table names reported by `SHOW TABLES`.
    pub fn with_tables<I, S>(self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Queries containing `pattern` (case-insensitive) succeed with `result`.
    pub fn with_result(self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.script(pattern, Outcome::Succeed(result))
    }

    /// Queries containing `pattern` fail with the given service diagnostic.
    pub fn with_failure(self, pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        self.script(pattern, Outcome::Fail(reason.into()))
    }

    /// Queries containing `pattern` end up cancelled.
    pub fn with_cancellation(self, pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        self.script(pattern, Outcome::Cancel(reason.into()))
    }

    /// Queries containing `pattern` stay RUNNING forever.
    pub fn with_hang(self, pattern: impl Into<String>) -> Self {
        self.script(pattern, Outcome::Hang)
    }

    /// Number of RUNNING polls each execution reports before its outcome.
    pub fn with_polls_before_completion(self, polls: usize) -> Self {
        self.state().polls_before_completion = polls;
        self
    }

    /// Every call fails with an authentication error.
    pub fn with_auth_failure(self, message: impl Into<String>) -> Self {
        self.state().auth_failure = Some(message.into());
        self
    }

    /// Query calls fail with a service error; credential checks still pass.
    pub fn unreachable(self, message: impl Into<String>) -> Self {
        self.state().unreachable = Some(message.into());
        self
    }

    /// SQL strings submitted so far, in order.
    pub fn submitted_queries(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    /// Number of status polls served.
    pub fn status_calls(&self) -> usize {
        self.state().status_calls
    }

    fn script(self, pattern: impl Into<String>, outcome: Outcome) -> Self {
        self.state()
            .scripted
            .push((pattern.into().to_lowercase(), outcome));
        self
    }

    fn check_reachable(state: &MockState) -> Result<()> {
        if let Some(message) = &state.auth_failure {
            return Err(TlcError::auth(message.clone()));
        }
        if let Some(message) = &state.unreachable {
            return Err(TlcError::service(message.clone()));
        }
        Ok(())
    }

    fn default_outcome(state: &MockState, sql: &str) -> Outcome {
        let sql_upper = sql.trim().to_uppercase();

        if sql_upper == "SELECT 1" {
            return Outcome::Succeed(QueryResult::with_data(
                vec![ColumnInfo::new("_col0", "integer")],
                vec![vec![Value::Int(1)]],
            ));
        }

        if sql_upper.starts_with("SHOW TABLES") {
            let rows = state
                .tables
                .iter()
                .map(|t| vec![Value::String(t.clone())])
                .collect();
            return Outcome::Succeed(QueryResult::with_data(
                vec![ColumnInfo::new("tab_name", "string")],
                rows,
            ));
        }

        if sql_upper.starts_with("SELECT") || sql_upper.starts_with("WITH") {
            return Outcome::Succeed(QueryResult::with_data(
                vec![ColumnInfo::new("result", "varchar")],
                vec![vec![Value::String(format!("Mock result for: {}", sql))]],
            ));
        }

        Outcome::Succeed(QueryResult::default())
    }
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn submit(&self, sql: &str) -> Result<String> {
        let mut state = self.state();
        Self::check_reachable(&state)?;

        let sql_lower = sql.to_lowercase();
        let outcome = state
            .scripted
            .iter()
            .find(|(pattern, _)| sql_lower.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Self::default_outcome(&state, sql));

        state.next_id += 1;
        let id = format!("mock-{:04}", state.next_id);
        state.submitted.push(sql.to_string());
        state.executions.insert(
            id.clone(),
            Execution {
                sql: sql.to_string(),
                outcome,
                polls: 0,
            },
        );
        Ok(id)
    }

    async fn status(&self, execution_id: &str) -> Result<QueryExecution> {
        let mut state = self.state();
        Self::check_reachable(&state)?;
        state.status_calls += 1;
        let polls_before_completion = state.polls_before_completion;

        let execution = state
            .executions
            .get_mut(execution_id)
            .ok_or_else(|| TlcError::query_failed(format!("QueryExecution {execution_id} was not found")))?;
        execution.polls += 1;

        let (exec_state, reason) = if execution.polls <= polls_before_completion {
            (ExecutionState::Running, None)
        } else {
            match &execution.outcome {
                Outcome::Succeed(_) => (ExecutionState::Succeeded, None),
                Outcome::Fail(reason) => (ExecutionState::Failed, Some(reason.clone())),
                Outcome::Cancel(reason) => (ExecutionState::Cancelled, Some(reason.clone())),
                Outcome::Hang => (ExecutionState::Running, None),
            }
        };

        let statement_kind = if execution.sql.trim().to_uppercase().starts_with("SHOW") {
            StatementKind::Utility
        } else {
            StatementKind::Dml
        };

        Ok(QueryExecution {
            id: execution_id.to_string(),
            state: exec_state,
            state_change_reason: reason,
            statement_kind: Some(statement_kind),
            output_location: Some(format!("s3://mock-results/{execution_id}.csv")),
        })
    }

    async fn fetch_results(
        &self,
        execution: &QueryExecution,
        limit: Option<usize>,
    ) -> Result<QueryResult> {
        if execution.state != ExecutionState::Succeeded {
            return Err(TlcError::internal(format!(
                "Cannot read results of {} execution {}",
                execution.state, execution.id
            )));
        }

        let state = self.state();
        Self::check_reachable(&state)?;
        let stored = state
            .executions
            .get(&execution.id)
            .ok_or_else(|| TlcError::internal(format!("Unknown execution {}", execution.id)))?;

        match &stored.outcome {
            Outcome::Succeed(result) => {
                let mut rows = result.rows.clone();
                if let Some(limit) = limit {
                    rows.truncate(limit);
                }
                Ok(QueryResult::with_data(result.columns.clone(), rows))
            }
            _ => Err(TlcError::internal(format!(
                "Execution {} has no results",
                execution.id
            ))),
        }
    }

    async fn verify_credentials(&self) -> Result<String> {
        match &self.state().auth_failure {
            Some(message) => Err(TlcError::auth(message.clone())),
            None => Ok("arn:aws:iam::123456789012:user/mock".to_string()),
        }
    }
}

#[async_trait]
impl ServiceConnector for MockQueryService {
    async fn connect(&self, _settings: &AthenaSettings) -> Result<Arc<dyn QueryService>> {
        Ok(Arc::new(self.clone()))
    }
}
