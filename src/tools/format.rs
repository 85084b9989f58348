//! Text rendering of tool responses.

use serde_json::{Map, Value as JsonValue};

use crate::athena::QueryResult;
use crate::error::ErrorKind;

/// Converts result rows into JSON objects keyed by column name.
pub fn rows_as_objects(result: &QueryResult) -> Vec<JsonValue> {
    result
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, JsonValue> = result
                .columns
                .iter()
                .zip(row.iter())
                .map(|(column, value)| (column.name.clone(), value.to_json()))
                .collect();
            JsonValue::Object(object)
        })
        .collect()
}

/// Renders a successful query for the host.
pub fn format_query_success(sql: &str, result: &QueryResult) -> String {
    let mut output = String::from("Query executed successfully!\n\n");
    output.push_str(&format!("SQL: {}\n\n", sql.trim()));
    output.push_str(&format!(
        "Returned {} {}\n\n",
        result.row_count,
        if result.row_count == 1 { "row" } else { "rows" }
    ));

    if let Some(warning) = result.truncation_warning() {
        output.push_str(&warning);
        output.push_str("\n\n");
    }

    if result.is_empty() {
        output.push_str("No results returned.");
    } else {
        let rows = JsonValue::Array(rows_as_objects(result));
        output.push_str("Results:\n");
        output.push_str(&serde_json::to_string_pretty(&rows).unwrap_or_else(|_| rows.to_string()));
    }

    output
}

/// Renders a failed query for the host.
pub fn format_query_failure(sql: &str, kind: ErrorKind, message: &str) -> String {
    format!(
        "Query failed!\n\nSQL: {}\n\nError ({}): {}",
        sql.trim(),
        kind,
        message
    )
}
