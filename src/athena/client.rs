//! AWS Athena implementation of the query service.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::config::Credentials;
use aws_sdk_athena::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_athena::types::{
    QueryExecutionContext, QueryExecutionState, ResultConfiguration, Row as AthenaRow,
    StatementType,
};
use std::sync::Arc;
use tracing::debug;

use super::{
    ColumnInfo, ExecutionState, QueryExecution, QueryResult, QueryService, Row, ServiceConnector,
    StatementKind, Value, MAX_PAGE_SIZE,
};
use crate::config::AthenaSettings;
use crate::error::{ErrorKind, Result, TlcError};

/// Query service backed by AWS Athena, with STS for identity checks.
#[derive(Debug, Clone)]
pub struct AthenaClient {
    athena: aws_sdk_athena::Client,
    sts: aws_sdk_sts::Client,
    database: String,
    output_location: String,
    work_group: Option<String>,
}

impl AthenaClient {
    /// Builds SDK clients for the configured region and credentials.
    ///
    /// No request is made here; bad credentials surface on first use.
    pub async fn connect(settings: &AthenaSettings) -> Result<Self> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));

        if let Some(pair) = &settings.credentials {
            loader = loader.credentials_provider(Credentials::new(
                pair.access_key_id.clone(),
                pair.secret_access_key.clone(),
                pair.session_token.clone(),
                None,
                "tlc-athena-environment",
            ));
        }

        let sdk_config = loader.load().await;
        debug!("AWS SDK configured for {}", settings.display_string());

        Ok(Self {
            athena: aws_sdk_athena::Client::new(&sdk_config),
            sts: aws_sdk_sts::Client::new(&sdk_config),
            database: settings.database.clone(),
            output_location: settings.output_location.clone(),
            work_group: settings.work_group.clone(),
        })
    }
}

#[async_trait]
impl QueryService for AthenaClient {
    async fn submit(&self, sql: &str) -> Result<String> {
        let output = self
            .athena
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&self.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&self.output_location)
                    .build(),
            )
            .set_work_group(self.work_group.clone())
            .send()
            .await
            .map_err(|e| map_sdk_error("StartQueryExecution", e))?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| TlcError::service("StartQueryExecution returned no execution id"))
    }

    async fn status(&self, execution_id: &str) -> Result<QueryExecution> {
        let output = self
            .athena
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetQueryExecution", e))?;

        let execution = output.query_execution().ok_or_else(|| {
            TlcError::service(format!("No execution details returned for {execution_id}"))
        })?;
        let status = execution.status();

        let state = match status.and_then(|s| s.state()) {
            Some(state) => convert_state(state)?,
            None => ExecutionState::Submitted,
        };

        let state_change_reason = status
            .and_then(|s| s.state_change_reason())
            .or_else(|| {
                status
                    .and_then(|s| s.athena_error())
                    .and_then(|e| e.error_message())
            })
            .map(str::to_string);

        let statement_kind = execution.statement_type().and_then(|t| match t {
            StatementType::Dml => Some(StatementKind::Dml),
            StatementType::Ddl => Some(StatementKind::Ddl),
            StatementType::Utility => Some(StatementKind::Utility),
            _ => None,
        });

        Ok(QueryExecution {
            id: execution_id.to_string(),
            state,
            state_change_reason,
            statement_kind,
            output_location: execution
                .result_configuration()
                .and_then(|r| r.output_location())
                .map(str::to_string),
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

        // DML results repeat the column labels as the first row.
        let skip_header = execution.statement_kind == Some(StatementKind::Dml);
        let mut pager = ResultPager::new(limit, skip_header);
        let mut columns: Vec<ColumnInfo> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .athena
                .get_query_results()
                .query_execution_id(&execution.id)
                .max_results(pager.page_size() as i32)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error("GetQueryResults", e))?;

            let result_set = output.result_set();
            if columns.is_empty() {
                columns = result_set
                    .and_then(|r| r.result_set_metadata())
                    .map(|meta| {
                        meta.column_info()
                            .iter()
                            .map(|c| ColumnInfo::new(c.label().unwrap_or(c.name()), c.r#type()))
                            .collect()
                    })
                    .unwrap_or_default();
            }

            let page = result_set.map(|r| r.rows()).unwrap_or_default();
            rows.extend(pager.accept(page).iter().map(|row| decode_row(&columns, row)));

            next_token = output.next_token().map(str::to_string);
            if pager.is_done(next_token.is_some()) {
                break;
            }
        }

        debug!(
            "Fetched {} rows from {} ({})",
            rows.len(),
            execution.id,
            execution.output_location.as_deref().unwrap_or("unknown location")
        );
        Ok(QueryResult::with_data(columns, rows))
    }

    async fn verify_credentials(&self) -> Result<String> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_sdk_error("GetCallerIdentity", e))?;

        Ok(output
            .arn()
            .or_else(|| output.account())
            .unwrap_or("unknown identity")
            .to_string())
    }
}

/// Connects to Athena using the AWS SDK.
#[derive(Debug, Clone, Copy, Default)]
pub struct AthenaConnector;

#[async_trait]
impl ServiceConnector for AthenaConnector {
    async fn connect(&self, settings: &AthenaSettings) -> Result<Arc<dyn QueryService>> {
        Ok(Arc::new(AthenaClient::connect(settings).await?))
    }
}

/// Row accounting for a paged `GetQueryResults` read.
///
/// The header row, when present, only appears at the top of the first page
/// and counts against that page's `MaxResults`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResultPager {
    limit: Option<usize>,
    header_pending: bool,
    collected: usize,
}

impl ResultPager {
    fn new(limit: Option<usize>, skip_header: bool) -> Self {
        Self {
            limit,
            header_pending: skip_header,
            collected: 0,
        }
    }

    /// `MaxResults` for the next request.
    fn page_size(&self) -> usize {
        let header = usize::from(self.header_pending);
        self.limit
            .map(|l| l.saturating_sub(self.collected).saturating_add(header))
            .unwrap_or(MAX_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Returns the data rows of `page` to keep, dropping the header and
    /// anything past the limit.
    fn accept<'a, T>(&mut self, page: &'a [T]) -> &'a [T] {
        let start = usize::from(self.header_pending).min(page.len());
        self.header_pending = false;
        let data = &page[start..];
        let take = match self.limit {
            Some(l) => l.saturating_sub(self.collected).min(data.len()),
            None => data.len(),
        };
        self.collected += take;
        &data[..take]
    }

    fn is_done(&self, has_next_page: bool) -> bool {
        !has_next_page || self.limit.is_some_and(|l| self.collected >= l)
    }
}

fn convert_state(state: &QueryExecutionState) -> Result<ExecutionState> {
    match state {
        QueryExecutionState::Queued => Ok(ExecutionState::Submitted),
        QueryExecutionState::Running => Ok(ExecutionState::Running),
        QueryExecutionState::Succeeded => Ok(ExecutionState::Succeeded),
        QueryExecutionState::Failed => Ok(ExecutionState::Failed),
        QueryExecutionState::Cancelled => Ok(ExecutionState::Cancelled),
        other => Err(TlcError::service(format!(
            "Unrecognized execution state '{}'",
            other.as_str()
        ))),
    }
}

fn decode_row(columns: &[ColumnInfo], row: &AthenaRow) -> Row {
    let data = row.data();
    if columns.is_empty() {
        return data
            .iter()
            .map(|d| Value::from_athena("varchar", d.var_char_value()))
            .collect();
    }
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let raw = data.get(i).and_then(|d| d.var_char_value());
            Value::from_athena(&column.data_type, raw)
        })
        .collect()
}

/// Maps an AWS error code to the kind reported to callers.
pub fn classify_error_code(code: Option<&str>) -> ErrorKind {
    match code {
        Some(
            "UnrecognizedClientException"
            | "InvalidSignatureException"
            | "AccessDeniedException"
            | "ExpiredTokenException"
            | "ExpiredToken"
            | "InvalidClientTokenId"
            | "SignatureDoesNotMatch"
            | "MissingAuthenticationToken",
        ) => ErrorKind::AuthFailure,
        Some("InvalidRequestException") => ErrorKind::QueryFailed,
        _ => ErrorKind::ServiceUnavailable,
    }
}

fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> TlcError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if let Some(service_err) = err.as_service_error() {
        let message = service_err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
        return match classify_error_code(service_err.code()) {
            ErrorKind::AuthFailure => TlcError::auth(message),
            ErrorKind::QueryFailed => TlcError::query_failed(message),
            _ => TlcError::service(format!("{operation}: {message}")),
        };
    }

    let detail = DisplayErrorContext(&err).to_string();
    if detail.to_lowercase().contains("credentials") {
        TlcError::auth(detail)
    } else {
        TlcError::service(format!("{operation}: {detail}"))
    }
}
