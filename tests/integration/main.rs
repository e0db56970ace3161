//! Integration tests for Fleet-Sounding
//!
//! These tests use wiremock servers in place of company websites and
//! maritime sources and drive the public API end-to-end.

mod config_tests;
mod discovery_tests;
mod search_tests;
