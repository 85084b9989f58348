//! Integration tests for tlc-athena.

pub mod athena_test;
pub mod config_test;
pub mod diagnostics_test;
pub mod tools_test;
