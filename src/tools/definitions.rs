//! Tool definitions published to the agent host.

use serde::{Deserialize, Serialize};

pub const LIST_TABLES: &str = "list_tables";
pub const DESCRIBE_TABLE: &str = "describe_table";
pub const RUN_QUERY: &str = "run_query";

/// Tool definition for host function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Input parameters for the describe_table tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeTableInput {
    pub table: String,
}

/// Input parameters for the run_query tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunQueryInput {
    pub sql: String,
}

/// Returns the tool definitions available to the host.
pub fn get_tool_definitions(table_names: &[&str], max_rows: usize) -> Vec<ToolDefinition> {
    let tables = table_names.join(", ");
    vec![
        ToolDefinition {
            name: LIST_TABLES.to_string(),
            description: "List the NYC TLC tables available in Athena, with a description of \
                          each. Start here to decide which table answers the question."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: DESCRIBE_TABLE.to_string(),
            description: format!(
                "Get the ordered column list of one table. Available tables: {tables}."
            ),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "table": {
                        "type": "string",
                        "description": "Table name, exactly as returned by list_tables"
                    }
                },
                "required": ["table"]
            }),
        },
        ToolDefinition {
            name: RUN_QUERY.to_string(),
            description: format!(
                "Execute a read-only SQL query (Athena / Trino dialect) against the NYC TLC \
                 data. Available tables: {tables}. Returns up to {max_rows} rows; larger \
                 results are truncated and flagged. If given a natural-language question \
                 instead of SQL, returns the schema so SQL can be written first."
            ),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "The SQL query to execute"
                    }
                },
                "required": ["sql"]
            }),
        },
    ]
}
