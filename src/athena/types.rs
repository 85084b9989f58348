//! Execution and result types for the managed query service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{Result, TlcError};

/// Lifecycle state of a query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    /// Accepted by the service, not yet running (Athena's QUEUED).
    Submitted,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    /// Returns true for states that never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of statement the service reported for an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    /// SELECT and friends; results carry a header row.
    Dml,
    Ddl,
    Utility,
}

/// A query execution as last observed from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecution {
    pub id: String,
    pub state: ExecutionState,
    /// Service-provided explanation for the current state, if any.
    pub state_change_reason: Option<String>,
    pub statement_kind: Option<StatementKind>,
    /// Where the service wrote the result files.
    pub output_location: Option<String>,
}

impl QueryExecution {
    /// A freshly submitted execution.
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: ExecutionState::Submitted,
            state_change_reason: None,
            statement_kind: None,
            output_location: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Applies a newer observation of the same execution.
    ///
    /// Once terminal, the state is frozen: a different state is rejected,
    /// and re-observing the same state is a no-op.
    pub fn advance(&mut self, observed: QueryExecution) -> Result<()> {
        if observed.id != self.id {
            return Err(TlcError::internal(format!(
                "Status for execution {} applied to {}",
                observed.id, self.id
            )));
        }
        if self.is_terminal() {
            if observed.state != self.state {
                return Err(TlcError::internal(format!(
                    "Execution {} is {} and cannot become {}",
                    self.id, self.state, observed.state
                )));
            }
            return Ok(());
        }
        *self = observed;
        Ok(())
    }
}

/// Represents the result of a succeeded query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time from submission to terminal state plus fetch.
    #[serde(with = "duration_serde")]
    pub execution_time: Duration,

    /// Number of rows in the result (may be truncated).
    pub row_count: usize,

    /// Total number of rows before truncation (if known).
    pub total_rows: Option<usize>,

    /// Whether rows were dropped to honor the row cap.
    #[serde(default)]
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
            total_rows: Some(row_count),
            was_truncated: false,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Keeps at most `max_rows` rows, flagging the result when rows were dropped.
    ///
    /// When truncation happens the true total is unknown, so `total_rows`
    /// becomes `None`.
    pub fn truncate(&mut self, max_rows: usize) {
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.row_count = self.rows.len();
            self.total_rows = None;
            self.was_truncated = true;
        }
    }

    /// Returns a truncation note if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        if !self.was_truncated {
            return None;
        }
        Some(match self.total_rows {
            Some(total) => format!(
                "Result truncated: showing {} of {} rows",
                self.row_count, total
            ),
            None => format!(
                "Result truncated: showing {} rows; more rows were available",
                self.row_count
            ),
        })
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,

    /// Athena type name, e.g. `integer` or `varchar`.
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single decoded cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Decodes a raw Athena cell using the column's declared type.
    ///
    /// Athena returns every cell as text; values that do not parse as their
    /// declared type are kept as strings.
    pub fn from_athena(data_type: &str, raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Value::Null;
        };
        let base = data_type
            .split('(')
            .next()
            .unwrap_or(data_type)
            .trim()
            .to_ascii_lowercase();
        match base.as_str() {
            "tinyint" | "smallint" | "integer" | "int" | "bigint" => raw
                .parse()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            // decimal stays text; f64 would round wide values.
            "double" | "float" | "real" => raw
                .parse()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            "boolean" => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            _ => Value::String(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
        }
    }

    /// Converts to a plain JSON value for host responses.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Serde support for Duration (not natively supported by serde).
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
