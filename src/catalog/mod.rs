//! Static table catalog for the TLC dataset.
//!
//! The catalog is built once at startup and shared read-only by every
//! component that needs it.

mod tlc;

use crate::error::{Result, TlcError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A table the assistant is allowed to query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name, unique within a catalog.
    pub name: String,

    /// Human-readable description used to steer SQL generation.
    pub description: String,

    /// Column names in declaration order.
    pub columns: Vec<String>,
}

impl TableSchema {
    /// Creates a table schema from borrowed parts.
    pub fn new<I, S>(name: impl Into<String>, description: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ordered, validated set of table schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tables: Vec<TableSchema>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate names and tables without columns.
    pub fn new(tables: Vec<TableSchema>) -> Result<Self> {
        let mut seen = HashSet::new();
        for table in &tables {
            if table.name.trim().is_empty() {
                return Err(TlcError::config("Catalog table with empty name"));
            }
            if !seen.insert(table.name.as_str()) {
                return Err(TlcError::config(format!(
                    "Duplicate table '{}' in catalog",
                    table.name
                )));
            }
            if table.columns.is_empty() {
                return Err(TlcError::config(format!(
                    "Table '{}' has no columns",
                    table.name
                )));
            }
        }
        Ok(Self { tables })
    }

    /// The built-in NYC TLC catalog.
    pub fn nyc_tlc() -> Self {
        Self {
            tables: tlc::tables(),
        }
    }

    /// All tables in declaration order.
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Looks up a table by exact name.
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Formats the catalog for inclusion in host-facing guidance text.
    pub fn format_for_llm(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(|table| {
                format!(
                    "Table: {}\nDescription: {}\nColumns: {}\n\n",
                    table.name,
                    table.description,
                    table.columns.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("");

        format!("NYC TLC Database Schema:\n\n{}", tables_text)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::nyc_tlc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_catalog_tables() {
        let catalog = Catalog::nyc_tlc();
        assert_eq!(catalog.table_names(), vec!["gtp_tlc_data", "taxi_zones"]);
        assert!(Catalog::new(catalog.tables().to_vec()).is_ok());
    }

    #[test]
    fn test_builtin_columns_are_ordered() {
        let catalog = Catalog::nyc_tlc();
        let zones = catalog.get("taxi_zones").unwrap();
        assert_eq!(zones.columns.first().map(String::as_str), Some("objectid"));
        assert_eq!(
            zones.columns.last().map(String::as_str),
            Some("geometry_wkt")
        );

        let trips = catalog.get("gtp_tlc_data").unwrap();
        assert_eq!(trips.columns.len(), 22);
        assert_eq!(trips.columns[1], "tpep_pickup_datetime");
    }

    #[test]
    fn test_get_unknown_table() {
        let catalog = Catalog::nyc_tlc();
        assert!(catalog.get("trips").is_none());
        assert!(catalog.get("TAXI_ZONES").is_none());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Catalog::new(vec![
            TableSchema::new("trips", "a", ["fare"]),
            TableSchema::new("trips", "b", ["tip"]),
        ]);
        assert!(result.unwrap_err().to_string().contains("Duplicate table"));
    }

    #[test]
    fn test_rejects_table_without_columns() {
        let result = Catalog::new(vec![TableSchema::new(
            "trips",
            "no columns",
            Vec::<String>::new(),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_for_llm() {
        let catalog = Catalog::new(vec![TableSchema::new(
            "trips",
            "Trip records",
            ["pickup_time", "dropoff_time", "fare"],
        )])
        .unwrap();

        assert_eq!(
            catalog.format_for_llm(),
            "NYC TLC Database Schema:\n\n\
             Table: trips\n\
             Description: Trip records\n\
             Columns: pickup_time, dropoff_time, fare\n\n"
        );
    }
}
