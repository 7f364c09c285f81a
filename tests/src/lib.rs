//! Shared harness for the enrichment engine integration tests.

pub mod fake_api;
