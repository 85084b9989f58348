//! Query execution and input classification.
//!
//! This module isolates SQL submission, polling, and result retrieval from
//! the host-facing tool layer.

pub mod classify;
pub mod executor;

pub use classify::{classify_input, looks_like_sql, InputKind, LeadingKeyword};
pub use executor::{QueryExecutor, QueryRequest};
