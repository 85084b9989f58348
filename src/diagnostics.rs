//! Operator self-test.
//!
//! Checks configuration, credentials, connectivity, and table visibility,
//! then runs a small sample query. Every check is attempted; a check is
//! skipped only when it needs the output of one that failed.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::athena::{QueryService, ServiceConnector};
use crate::catalog::Catalog;
use crate::config::{AthenaSettings, Config, QueryConfig};
use crate::error::Result;
use crate::query::{QueryExecutor, QueryRequest};

pub const CHECK_CONFIGURATION: &str = "configuration";
pub const CHECK_CREDENTIALS: &str = "credentials";
pub const CHECK_CONNECTIVITY: &str = "connectivity";
pub const CHECK_TABLE_VISIBILITY: &str = "table_visibility";
pub const CHECK_SAMPLE_QUERY: &str = "sample_query";

/// Diagnostics queries are small; they get a shorter wait than tool calls.
const DIAGNOSTIC_MAX_WAIT: Duration = Duration::from_secs(30);

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            detail: detail.into(),
        }
    }

    fn skipped(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            detail: reason.into(),
        }
    }
}

/// Ordered results of a diagnostics run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub checks: Vec<CheckResult>,
}

impl DiagnosticReport {
    fn push(&mut self, check: CheckResult) {
        match check.status {
            CheckStatus::Pass => info!("{} passed: {}", check.name, check.detail),
            CheckStatus::Fail => warn!("{} failed: {}", check.name, check.detail),
            CheckStatus::Skipped => info!("{} skipped: {}", check.name, check.detail),
        }
        self.checks.push(check);
    }

    /// True only when every check passed.
    pub fn all_passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.status == CheckStatus::Pass)
    }

    pub fn passed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count()
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Process exit code for the operator CLI.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tlc-athena diagnostics")?;
        writeln!(f, "======================")?;
        for check in &self.checks {
            writeln!(f, "[{:<7}] {}: {}", check.status, check.name, check.detail)?;
        }
        writeln!(f)?;
        write!(
            f,
            "{}/{} checks passed",
            self.passed_count(),
            self.checks.len()
        )
    }
}

/// Runs diagnostics from a config load result.
///
/// A config that fails to load, or whose catalog is invalid, is reported as
/// a failed `configuration` check rather than aborting the run.
pub async fn diagnose_config<F>(
    loaded: Result<Config>,
    lookup: F,
    connector: &dyn ServiceConnector,
) -> DiagnosticReport
where
    F: Fn(&str) -> Option<String>,
{
    let prepared = loaded.and_then(|config| {
        let catalog = config.catalog()?;
        let settings = AthenaSettings::resolve(&config.athena, &lookup);
        Ok((config.query, catalog, settings))
    });

    match prepared {
        Ok((query, catalog, settings)) => {
            run_diagnostics(settings, connector, &catalog, &query).await
        }
        Err(e) => {
            run_diagnostics(Err(e), connector, &Catalog::nyc_tlc(), &QueryConfig::default()).await
        }
    }
}

/// Runs every check in order and collects the results.
pub async fn run_diagnostics(
    settings: Result<AthenaSettings>,
    connector: &dyn ServiceConnector,
    catalog: &Catalog,
    query_config: &QueryConfig,
) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();

    let settings = match settings {
        Ok(settings) => {
            report.push(CheckResult::pass(
                CHECK_CONFIGURATION,
                settings.display_string(),
            ));
            settings
        }
        Err(e) => {
            report.push(CheckResult::fail(CHECK_CONFIGURATION, e.to_string()));
            let reason = "requires valid configuration";
            for name in [
                CHECK_CREDENTIALS,
                CHECK_CONNECTIVITY,
                CHECK_TABLE_VISIBILITY,
                CHECK_SAMPLE_QUERY,
            ] {
                report.push(CheckResult::skipped(name, reason));
            }
            return report;
        }
    };

    let service: Arc<dyn QueryService> = match connector.connect(&settings).await {
        Ok(service) => service,
        Err(e) => {
            let detail = format!("could not create client: {e}");
            report.push(CheckResult::fail(CHECK_CREDENTIALS, detail.clone()));
            report.push(CheckResult::fail(CHECK_CONNECTIVITY, detail));
            report.push(CheckResult::skipped(
                CHECK_TABLE_VISIBILITY,
                "requires a successful connection",
            ));
            report.push(CheckResult::skipped(
                CHECK_SAMPLE_QUERY,
                "requires a visible table",
            ));
            return report;
        }
    };

    report.push(match service.verify_credentials().await {
        Ok(identity) => CheckResult::pass(CHECK_CREDENTIALS, format!("authenticated as {identity}")),
        Err(e) => CheckResult::fail(CHECK_CREDENTIALS, e.to_string()),
    });

    let executor = QueryExecutor::from_config(service, query_config)
        .with_max_wait(query_config.max_wait().min(DIAGNOSTIC_MAX_WAIT));

    let show_tables = format!("SHOW TABLES IN {}", settings.database);
    let listed: Vec<String> = match executor.execute(&QueryRequest::new(&show_tables)).await {
        Ok(result) => {
            let tables: Vec<String> = result
                .rows
                .iter()
                .filter_map(|row| row.first())
                .filter(|v| !v.is_null())
                .map(|v| v.to_display_string())
                .collect();
            report.push(CheckResult::pass(
                CHECK_CONNECTIVITY,
                format!("{} tables in {}", tables.len(), settings.database),
            ));
            tables
        }
        Err(e) => {
            report.push(CheckResult::fail(CHECK_CONNECTIVITY, e.to_string()));
            report.push(CheckResult::skipped(
                CHECK_TABLE_VISIBILITY,
                "requires a successful connection",
            ));
            report.push(CheckResult::skipped(
                CHECK_SAMPLE_QUERY,
                "requires a visible table",
            ));
            return report;
        }
    };

    let (visible, missing): (Vec<&str>, Vec<&str>) = catalog
        .table_names()
        .into_iter()
        .partition(|name| listed.iter().any(|t| t == name));

    let Some(first_visible) = visible.first().copied() else {
        report.push(CheckResult::fail(
            CHECK_TABLE_VISIBILITY,
            format!(
                "none of the expected tables ({}) are in {}",
                missing.join(", "),
                settings.database
            ),
        ));
        report.push(CheckResult::skipped(
            CHECK_SAMPLE_QUERY,
            "requires a visible table",
        ));
        return report;
    };

    let detail = if missing.is_empty() {
        format!("visible: {}", visible.join(", "))
    } else {
        format!(
            "visible: {}; missing: {}",
            visible.join(", "),
            missing.join(", ")
        )
    };
    report.push(CheckResult::pass(CHECK_TABLE_VISIBILITY, detail));

    let sample = format!("SELECT * FROM {first_visible} LIMIT 5");
    report.push(match executor.execute(&QueryRequest::new(&sample)).await {
        Ok(result) => CheckResult::pass(
            CHECK_SAMPLE_QUERY,
            format!(
                "{} returned {} rows ({} columns)",
                first_visible,
                result.row_count,
                result.columns.len()
            ),
        ),
        Err(e) => CheckResult::fail(CHECK_SAMPLE_QUERY, e.to_string()),
    });

    report
}
