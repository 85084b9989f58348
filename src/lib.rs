//! tlc-athena - natural-language access to the NYC TLC trip data in Athena.
//!
//! The library exposes the catalog, the Athena execution layer, and the
//! tool adapter served to agent hosts, for use by the binary and by
//! integration tests.

pub mod athena;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod query;
pub mod server;
pub mod tools;
