//! Integration tests against wiremock servers

mod common;
mod crawl_tests;
mod leyes_tests;
mod sii_tests;
