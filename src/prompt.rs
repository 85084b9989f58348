//! SQL-generation guidance handed to the agent host.
//!
//! Builds the server instructions and the reply sent when `run_query`
//! receives a question instead of SQL.

use crate::catalog::Catalog;

/// Server instructions template for the SQL assistant.
const INSTRUCTIONS_TEMPLATE: &str = r#"NYC TLC Athena server. Answer questions about New York City taxi trips by writing SQL and running it with the tools below.

TOOLS:
1) `list_tables` - table names and descriptions
2) `describe_table` - ordered column list for one table
3) `run_query` - execute SQL in Athena and return up to {max_rows} rows

{schema}
SQL GUIDELINES:
- Athena uses the Trino/Presto dialect (date_trunc, date_diff, approx_percentile, CTEs, window functions)
- Only read data: SELECT, WITH, SHOW, DESCRIBE, EXPLAIN
- Filter gtp_tlc_data on year and month whenever possible; they are partition columns and cut scan cost
- The type column distinguishes yellow and green taxi trips
- Join trips to zones with pulocationid / dolocationid = taxi_zones.locationid
- Aggregate instead of returning raw trips, and add LIMIT to exploratory queries
- Every query is billed by data scanned; avoid SELECT * on gtp_tlc_data without a LIMIT"#;

/// Builds the instructions published when the host connects.
pub fn build_instructions(catalog: &Catalog, max_rows: usize) -> String {
    INSTRUCTIONS_TEMPLATE
        .replace("{max_rows}", &max_rows.to_string())
        .replace("{schema}", &catalog.format_for_llm())
}

/// Builds the reply for a `run_query` call that received a question.
pub fn natural_language_guidance(question: &str, catalog: &Catalog) -> String {
    format!(
        "Natural language query detected: '{}'\n\n\
         Please generate SQL based on this question and the schema below:\n\n\
         {}\n\
         Then call run_query again with the generated SQL.",
        question.trim(),
        catalog.format_for_llm()
    )
}
